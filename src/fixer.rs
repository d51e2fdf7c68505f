// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fix planning and application
//!
//! Fixes are plain text substitutions. Every fix except `missing_alt` inserts
//! at most one element per pass, and only when the concrete markup is not
//! already there, so running the same fixes over their own output is a no-op.
//! A placeholder directive does not count as fixed: the fixer's job is to
//! put real markup in the document.

use crate::catalog::RuleKey;
use crate::detector::{alt_attribute, has_markup, image_has_alt, ATTRS, IMG_TAG};
use crate::document::Document;
use crate::error::{Result, SeobotError};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// Opening `<head>` tag (but not `<header>`)
static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"<head(?:\s{ATTRS})?>")).expect("valid regex"));

/// Opening `<html>` tag, capturing its attributes
static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"<html(\s{ATTRS})?>")).expect("valid regex"));

/// Issues seobot can fix automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKey {
    Viewport,
    Language,
    MetaRobots,
    Canonical,
    Favicon,
    Preconnect,
    AppleTouchIcon,
    MissingAlt,
}

impl FixKey {
    pub const ALL: [FixKey; 8] = [
        FixKey::Viewport,
        FixKey::Language,
        FixKey::MetaRobots,
        FixKey::Canonical,
        FixKey::Favicon,
        FixKey::Preconnect,
        FixKey::AppleTouchIcon,
        FixKey::MissingAlt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FixKey::Viewport => "viewport",
            FixKey::Language => "language",
            FixKey::MetaRobots => "meta_robots",
            FixKey::Canonical => "canonical",
            FixKey::Favicon => "favicon",
            FixKey::Preconnect => "preconnect",
            FixKey::AppleTouchIcon => "apple_touch_icon",
            FixKey::MissingAlt => "missing_alt",
        }
    }

    /// The catalog rule this fix remediates
    pub fn rule_key(self) -> RuleKey {
        match self {
            FixKey::Viewport => RuleKey::Viewport,
            FixKey::Language => RuleKey::Language,
            FixKey::MetaRobots => RuleKey::MetaRobots,
            FixKey::Canonical => RuleKey::Canonical,
            FixKey::Favicon => RuleKey::Favicon,
            FixKey::Preconnect => RuleKey::Preconnect,
            FixKey::AppleTouchIcon => RuleKey::AppleTouchIcon,
            FixKey::MissingAlt => RuleKey::ImageAlt,
        }
    }

    /// The fix that remediates a catalog rule, if there is one
    pub fn for_rule(key: RuleKey) -> Option<FixKey> {
        FixKey::ALL.into_iter().find(|fix| fix.rule_key() == key)
    }
}

impl fmt::Display for FixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixKey {
    type Err = SeobotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FixKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| SeobotError::UnknownIssue(s.to_string()))
    }
}

/// Validate a list of issue keys, rejecting the whole list on the first unknown key
pub fn parse_fix_keys<S: AsRef<str>>(raw: &[S]) -> Result<Vec<FixKey>> {
    raw.iter().map(|key| key.as_ref().parse()).collect()
}

/// Values written into inserted markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOptions {
    /// Value of the inserted `lang` attribute
    pub language: String,
    /// Alt text given to images that have none
    pub alt_text: String,
    /// Used for canonical and preconnect hrefs; empty leaves them blank
    pub site_url: String,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            alt_text: "Image".to_string(),
            site_url: String::new(),
        }
    }
}

/// Result of one fix pass over one document
#[derive(Debug, Clone, Serialize)]
pub struct FixOutcome {
    pub path: PathBuf,
    pub changed: bool,
    pub fixes_applied: usize,
    #[serde(skip_serializing)]
    pub new_text: String,
}

/// Applies fixes to documents
#[derive(Debug, Clone, Default)]
pub struct Fixer {
    options: FixOptions,
}

impl Fixer {
    pub fn new(options: FixOptions) -> Self {
        Self { options }
    }

    /// Apply `keys` to `document` in order
    pub fn apply(&self, document: &Document, keys: &[FixKey]) -> FixOutcome {
        let mut text = document.raw_text.clone();
        let mut fixes_applied = 0;

        for &key in keys {
            let applied = self.apply_one(&mut text, key);
            if applied > 0 {
                debug!(path = %document.path.display(), fix = %key, applied, "Applied fix");
            }
            fixes_applied += applied;
        }

        FixOutcome {
            path: document.path.clone(),
            changed: text != document.raw_text,
            fixes_applied,
            new_text: text,
        }
    }

    /// Apply raw issue keys, skipping any that are not fixable
    pub fn apply_keys<S: AsRef<str>>(&self, document: &Document, keys: &[S]) -> FixOutcome {
        let parsed: Vec<FixKey> = keys
            .iter()
            .filter_map(|key| match key.as_ref().parse() {
                Ok(fix) => Some(fix),
                Err(_) => {
                    debug!(issue = key.as_ref(), "Skipping unknown issue");
                    None
                }
            })
            .collect();
        self.apply(document, &parsed)
    }

    fn apply_one(&self, text: &mut String, key: FixKey) -> usize {
        match key {
            FixKey::MissingAlt => self.fill_missing_alt(text),
            FixKey::Language => {
                if has_markup(text.as_str(), RuleKey::Language) {
                    return 0;
                }
                self.add_language(text)
            }
            _ => {
                if has_markup(text.as_str(), key.rule_key()) {
                    return 0;
                }
                match self.head_markup(key) {
                    Some(markup) => insert_after_head(text, &markup),
                    None => 0,
                }
            }
        }
    }

    /// Markup inserted after `<head>` for a fix
    fn head_markup(&self, key: FixKey) -> Option<String> {
        let url = escape_attr(&self.options.site_url);
        let markup = match key {
            FixKey::Viewport => {
                r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#
                    .to_string()
            }
            FixKey::MetaRobots => r#"<meta name="robots" content="index, follow">"#.to_string(),
            FixKey::Canonical => format!(r#"<link rel="canonical" href="{}">"#, url),
            FixKey::Favicon => {
                r#"<link rel="icon" type="image/x-icon" href="/favicon.ico">"#.to_string()
            }
            FixKey::Preconnect => format!(
                "<link rel=\"preconnect\" href=\"{url}\">\n    <link rel=\"dns-prefetch\" href=\"{url}\">"
            ),
            FixKey::AppleTouchIcon => {
                r#"<link rel="apple-touch-icon" sizes="180x180" href="/apple-touch-icon.png">"#
                    .to_string()
            }
            FixKey::Language | FixKey::MissingAlt => return None,
        };
        Some(markup)
    }

    /// Add a `lang` attribute to the first `<html>` tag
    fn add_language(&self, text: &mut String) -> usize {
        let Some(caps) = HTML_OPEN.captures(text.as_str()) else {
            return 0;
        };
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let replacement = format!("<html lang=\"{}\"{}>", escape_attr(&self.options.language), attrs);
        let range = caps.get(0).map_or(0..0, |m| m.range());
        text.replace_range(range, &replacement);
        1
    }

    /// Give every image without a non-empty alt the configured alt text
    fn fill_missing_alt(&self, text: &mut String) -> usize {
        let alt = match self.options.alt_text.trim() {
            "" => "Image".to_string(),
            value => escape_attr(value),
        };

        let mut count = 0;
        let rewritten = IMG_TAG.replace_all(text.as_str(), |caps: &Captures| {
            let tag = &caps[0];
            if image_has_alt(tag) {
                return tag.to_string();
            }
            count += 1;
            with_alt(tag, &alt)
        });

        if count > 0 {
            let rewritten = rewritten.into_owned();
            *text = rewritten;
        }
        count
    }
}

/// Apply `keys` with default [`FixOptions`]
pub fn apply_fixes(document: &Document, keys: &[FixKey]) -> FixOutcome {
    Fixer::default().apply(document, keys)
}

/// Insert `markup` on its own line right after the first `<head>` tag
fn insert_after_head(text: &mut String, markup: &str) -> usize {
    match HEAD_OPEN.find(text.as_str()) {
        Some(head) => {
            text.insert_str(head.end(), &format!("\n    {}", markup));
            1
        }
        None => 0,
    }
}

/// Rewrite one `<img>` tag so it carries `alt`
fn with_alt(tag: &str, alt: &str) -> String {
    // an empty alt attribute is filled in rather than duplicated
    if let Some((existing, _)) = alt_attribute(tag) {
        return format!(
            "{} alt=\"{}\"{}",
            &tag[..existing.start],
            alt,
            &tag[existing.end..]
        );
    }

    let (body, close) = match tag.strip_suffix("/>") {
        Some(body) => (body, " />"),
        None => (tag.strip_suffix('>').unwrap_or(tag), ">"),
    };
    format!("{} alt=\"{}\"{}", body.trim_end(), alt, close)
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tier;
    use crate::classifier::audit;
    use crate::detector::detect_key;

    fn doc(text: &str) -> Document {
        Document::new("page.html", text)
    }

    #[test]
    fn test_parse_fix_keys() {
        let keys = parse_fix_keys(&["viewport", "missing_alt"]).unwrap();
        assert_eq!(keys, vec![FixKey::Viewport, FixKey::MissingAlt]);

        let err = parse_fix_keys(&["viewport", "og_title"]).unwrap_err();
        assert!(matches!(err, SeobotError::UnknownIssue(ref k) if k == "og_title"));
    }

    #[test]
    fn test_fix_keys_map_to_fixable_rules() {
        for key in FixKey::ALL {
            assert!(crate::catalog::rule_for(key.rule_key()).fixable);
            assert_eq!(FixKey::for_rule(key.rule_key()), Some(key));
        }
        assert_eq!(FixKey::for_rule(RuleKey::Title), None);
    }

    #[test]
    fn test_minimal_document_end_to_end() {
        let d = doc("<html><head></head><body></body></html>");
        let before = audit(&d, Tier::A);
        assert_eq!(before.findings.len(), 5);

        let outcome = apply_fixes(
            &d,
            &[FixKey::Viewport, FixKey::Canonical, FixKey::Language],
        );
        assert!(outcome.changed);
        assert_eq!(outcome.fixes_applied, 3);

        for key in [RuleKey::Viewport, RuleKey::Canonical, RuleKey::Language] {
            assert!(detect_key(&outcome.new_text, key), "{} still missing", key);
        }
        let after = audit(&doc(&outcome.new_text), Tier::A);
        assert_eq!(after.findings.len(), 2);
    }

    #[test]
    fn test_fixes_are_idempotent() {
        let inputs = [
            "<html><head></head><body><img src=\"a.png\"></body></html>",
            "<html class=\"dark\"><head data-x=\"1\"><title>t</title></head></html>",
            "<div>fragment without anchors <img src=b.png/></div>",
            "",
        ];
        for input in inputs {
            let first = apply_fixes(&doc(input), &FixKey::ALL);
            let second = apply_fixes(&doc(&first.new_text), &FixKey::ALL);
            assert!(!second.changed, "second pass changed {:?}", input);
            assert_eq!(second.fixes_applied, 0);
            assert_eq!(second.new_text, first.new_text);
        }
    }

    #[test]
    fn test_one_insertion_per_rule_per_pass() {
        let d = doc("<html><head></head><head></head></html>");
        let outcome = apply_fixes(&d, &[FixKey::MetaRobots, FixKey::MetaRobots]);
        assert_eq!(outcome.fixes_applied, 1);
        assert_eq!(outcome.new_text.matches("name=\"robots\"").count(), 1);
    }

    #[test]
    fn test_head_insertion_keeps_head_attributes() {
        let d = doc("<html><head profile=\"x\"><title>t</title></head></html>");
        let outcome = apply_fixes(&d, &[FixKey::Favicon]);
        assert!(outcome
            .new_text
            .starts_with("<html><head profile=\"x\">\n    <link rel=\"icon\""));
    }

    #[test]
    fn test_header_is_not_an_anchor() {
        let d = doc("<body><header>Top</header></body>");
        let outcome = apply_fixes(&d, &[FixKey::Viewport]);
        assert!(!outcome.changed);
        assert_eq!(outcome.fixes_applied, 0);
    }

    #[test]
    fn test_language_keeps_existing_attributes() {
        let d = doc("<html class=\"no-js\"><head></head></html>");
        let outcome = apply_fixes(&d, &[FixKey::Language]);
        assert_eq!(outcome.fixes_applied, 1);
        assert!(outcome
            .new_text
            .starts_with("<html lang=\"en\" class=\"no-js\">"));
    }

    #[test]
    fn test_placeholder_only_document_still_gets_markup() {
        let d = doc("<html><head>@yield('canonical_url')</head></html>");
        assert!(detect_key(&d.raw_text, RuleKey::Canonical));

        let outcome = apply_fixes(&d, &[FixKey::Canonical]);
        assert_eq!(outcome.fixes_applied, 1);
        assert!(outcome.new_text.contains("<link rel=\"canonical\""));
    }

    #[test]
    fn test_missing_alt_counts_each_image() {
        let d = doc(r#"<img src="a.png" alt="x"><img src="b.png"><img src="c.png" alt=""><img src="d.png"/>"#);
        assert!(!detect_key(&d.raw_text, RuleKey::ImageAlt));

        let outcome = apply_fixes(&d, &[FixKey::MissingAlt]);
        assert_eq!(outcome.fixes_applied, 3);
        assert_eq!(
            outcome.new_text,
            r#"<img src="a.png" alt="x"><img src="b.png" alt="Image"><img src="c.png" alt="Image"><img src="d.png" alt="Image" />"#
        );
        assert!(detect_key(&outcome.new_text, RuleKey::ImageAlt));
    }

    #[test]
    fn test_two_images_one_without_alt() {
        let d = doc(r#"<p><img src="1.png" alt="x"> <img src="2.png"></p>"#);
        assert!(!detect_key(&d.raw_text, RuleKey::ImageAlt));

        let outcome = apply_fixes(&d, &[FixKey::MissingAlt]);
        assert_eq!(outcome.fixes_applied, 1);
        assert!(detect_key(&outcome.new_text, RuleKey::ImageAlt));
    }

    #[test]
    fn test_apply_keys_skips_unknown() {
        let d = doc("<html><head></head></html>");
        let outcome = Fixer::default().apply_keys(&d, &["bogus", "viewport", "title"]);
        assert_eq!(outcome.fixes_applied, 1);
    }

    #[test]
    fn test_options_flow_into_markup() {
        let fixer = Fixer::new(FixOptions {
            language: "de".to_string(),
            alt_text: "Bild".to_string(),
            site_url: "https://example.de".to_string(),
        });
        let d = doc("<html><head></head><body><img src=\"a.png\"></body></html>");
        let outcome = fixer.apply(
            &d,
            &[FixKey::Language, FixKey::Preconnect, FixKey::MissingAlt],
        );
        assert!(outcome.new_text.contains("<html lang=\"de\">"));
        assert!(outcome
            .new_text
            .contains("<link rel=\"preconnect\" href=\"https://example.de\">"));
        assert!(outcome
            .new_text
            .contains("<link rel=\"dns-prefetch\" href=\"https://example.de\">"));
        assert!(outcome.new_text.contains("alt=\"Bild\""));
        assert_eq!(outcome.fixes_applied, 3);
    }

    #[test]
    fn test_already_fixed_document_is_unchanged() {
        let d = doc(r#"<html lang="en"><head><meta name="viewport" content="x"></head></html>"#);
        let outcome = apply_fixes(&d, &[FixKey::Viewport, FixKey::Language]);
        assert!(!outcome.changed);
        assert_eq!(outcome.new_text, d.raw_text);
    }

    #[test]
    fn test_alt_text_with_angle_brackets_is_idempotent() {
        let fixer = Fixer::new(FixOptions {
            alt_text: "a > b".to_string(),
            ..FixOptions::default()
        });
        let first = fixer.apply(&doc(r#"<img src="a.png">"#), &[FixKey::MissingAlt]);
        assert_eq!(first.new_text, r#"<img src="a.png" alt="a &gt; b">"#);

        let second = fixer.apply(&doc(&first.new_text), &[FixKey::MissingAlt]);
        assert!(!second.changed);
        assert_eq!(second.fixes_applied, 0);
    }

    #[test]
    fn test_template_expressions_in_attributes_are_preserved() {
        let text = r#"<img src="{{ $post->image }}" alt="Cover"><img src="{{ $post->thumb }}">"#;
        let outcome = apply_fixes(&doc(text), &[FixKey::MissingAlt]);
        assert_eq!(outcome.fixes_applied, 1);
        assert_eq!(
            outcome.new_text,
            r#"<img src="{{ $post->image }}" alt="Cover"><img src="{{ $post->thumb }}" alt="Image">"#
        );
    }

    #[test]
    fn test_anchors_skip_quoted_greater_than() {
        let d = doc(r#"<html data-theme="{{ $user->theme }}"><head data-x="a>b"></head></html>"#);
        let outcome = apply_fixes(&d, &[FixKey::Language, FixKey::MetaRobots]);
        assert_eq!(outcome.fixes_applied, 2);
        assert!(outcome
            .new_text
            .starts_with(r#"<html lang="en" data-theme="{{ $user->theme }}"><head data-x="a>b">"#));
        assert!(outcome.new_text.contains("\n    <meta name=\"robots\""));
    }

    #[test]
    fn test_data_lang_does_not_count_as_language() {
        let d = doc(r#"<html data-lang="x"><head></head></html>"#);
        let outcome = apply_fixes(&d, &[FixKey::Language]);
        assert_eq!(outcome.fixes_applied, 1);
        assert!(outcome.new_text.starts_with(r#"<html lang="en" data-lang="x">"#));
    }
}
