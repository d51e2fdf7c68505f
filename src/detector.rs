// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rule detection
//!
//! Detection works on pattern-level evidence, not a parse tree. Each rule key
//! maps to one strategy in a lookup table:
//!
//! - **Signature**: a concrete markup pattern (e.g. `<meta name="robots">`),
//!   optionally paired with a named placeholder field. A template that defers
//!   the element to a placeholder directive (`@yield('title')`,
//!   `@section('og_image', ...)`, `{% block canonical_url %}`) counts as
//!   present, since it can render the element.
//! - **ImageAlt**: every `<img>` must carry a non-empty `alt`.
//! - **HeadingHierarchy**: heading levels may never skip downwards.
//!
//! Keys with no entry in the table are treated as satisfied.

use crate::catalog::{Rule, RuleKey};
use crate::document::Document;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// A run of attributes inside a tag; quoted values may contain `>`
pub(crate) const ATTRS: &str = r#"(?:[^>"']|"[^"]*"|'[^']*')*"#;

/// Matches any `<img ...>` opening tag
pub(crate) static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"<img\b{ATTRS}>")).expect("valid regex"));

/// One attribute of a tag, with its value in whichever quoting it uses
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+([^\s=>"'/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid regex")
});

static HEADING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<h([1-6])(?:\s{ATTRS})?>")).expect("valid regex")
});

/// How a single rule is recognised
enum Strategy {
    Signature {
        markup: Regex,
        placeholder: Option<Regex>,
    },
    ImageAlt,
    HeadingHierarchy,
}

/// Build the placeholder directive pattern for a logical field name
fn placeholder_pattern(field: &str) -> Regex {
    let field = regex::escape(field);
    Regex::new(&format!(
        r#"@(?:section|yield)\(\s*['"]{field}['"]|\{{%-?\s*block\s+{field}\s*-?%\}}"#
    ))
    .expect("valid regex")
}

/// `<element ... attr="value" ...>` with the attribute anywhere in the tag
fn tag_with(element: &str, attr: &str, value: &str) -> String {
    format!(r#"<{element}\b{ATTRS}\s{attr}\s*=\s*['"]{value}['"]{ATTRS}>"#)
}

fn signature(markup: &str, placeholder: Option<&str>) -> Strategy {
    Strategy::Signature {
        markup: Regex::new(markup).expect("valid regex"),
        placeholder: placeholder.map(placeholder_pattern),
    }
}

static STRATEGIES: LazyLock<HashMap<RuleKey, Strategy>> = LazyLock::new(|| {
    let mut table = HashMap::new();

    table.insert(
        RuleKey::Title,
        signature(&format!(r"<title(?:\s{ATTRS})?>"), Some("title")),
    );
    table.insert(
        RuleKey::MetaDescription,
        signature(
            &tag_with("meta", "name", "description"),
            Some("meta_description"),
        ),
    );
    table.insert(
        RuleKey::MetaKeywords,
        signature(&tag_with("meta", "name", "keywords"), Some("meta_keywords")),
    );
    table.insert(
        RuleKey::Canonical,
        signature(&tag_with("link", "rel", "canonical"), Some("canonical_url")),
    );
    table.insert(
        RuleKey::MetaRobots,
        signature(&tag_with("meta", "name", "robots"), Some("meta_robots")),
    );
    table.insert(
        RuleKey::OgTitle,
        signature(&tag_with("meta", "property", "og:title"), Some("og_title")),
    );
    table.insert(
        RuleKey::OgDescription,
        signature(
            &tag_with("meta", "property", "og:description"),
            Some("og_description"),
        ),
    );
    table.insert(
        RuleKey::OgImage,
        signature(&tag_with("meta", "property", "og:image"), Some("og_image")),
    );
    table.insert(
        RuleKey::TwitterCard,
        signature(
            &tag_with("meta", "name", "twitter:card"),
            Some("twitter_card"),
        ),
    );
    table.insert(
        RuleKey::SchemaJson,
        signature(
            &tag_with("script", "type", r"application/ld\+json"),
            Some("schema"),
        ),
    );
    table.insert(
        RuleKey::Favicon,
        signature(&tag_with("link", "rel", "(?:shortcut )?icon"), Some("favicon")),
    );
    table.insert(
        RuleKey::AppleTouchIcon,
        signature(
            &tag_with("link", "rel", "apple-touch-icon"),
            Some("apple_touch_icon"),
        ),
    );
    table.insert(
        RuleKey::Preconnect,
        signature(
            &tag_with("link", "rel", "(?:preconnect|dns-prefetch)"),
            Some("preconnect"),
        ),
    );
    table.insert(
        RuleKey::LanguageAlternates,
        signature(
            &format!(
                r#"<link\b{ATTRS}\srel\s*=\s*['"]alternate['"]{ATTRS}\shreflang\s*="#
            ),
            Some("language_alternates"),
        ),
    );

    // structural attributes have no placeholder form
    table.insert(
        RuleKey::Viewport,
        signature(&tag_with("meta", "name", "viewport"), None),
    );
    table.insert(
        RuleKey::Language,
        signature(&format!(r"<html\b{ATTRS}\slang\s*="), None),
    );

    table.insert(RuleKey::ImageAlt, Strategy::ImageAlt);
    table.insert(RuleKey::HeadingsHierarchy, Strategy::HeadingHierarchy);

    table
});

/// Check whether `document` satisfies `rule`
pub fn detect(document: &Document, rule: &Rule) -> bool {
    detect_key(document.text(), rule.key)
}

/// Check whether `text` satisfies the rule identified by `key`
pub fn detect_key(text: &str, key: RuleKey) -> bool {
    match STRATEGIES.get(&key) {
        Some(Strategy::Signature {
            markup,
            placeholder,
        }) => {
            markup.is_match(text)
                || placeholder
                    .as_ref()
                    .is_some_and(|directive| directive.is_match(text))
        }
        Some(Strategy::ImageAlt) => all_images_have_alt(text),
        Some(Strategy::HeadingHierarchy) => hierarchy_is_valid(&heading_levels(text)),
        None => true,
    }
}

/// Check for the concrete markup form of `key` only, ignoring placeholders
///
/// Rules without a markup signature report `false`.
pub fn has_markup(text: &str, key: RuleKey) -> bool {
    match STRATEGIES.get(&key) {
        Some(Strategy::Signature { markup, .. }) => markup.is_match(text),
        _ => false,
    }
}

/// Byte range and value of the `alt` attribute in a single tag
///
/// The range starts at the whitespace before the attribute name. A bare
/// `alt` with no value reports an empty value.
pub(crate) fn alt_attribute(tag: &str) -> Option<(std::ops::Range<usize>, &str)> {
    ATTRIBUTE.captures_iter(tag).find_map(|caps| {
        let name = caps.get(1)?;
        if !name.as_str().eq_ignore_ascii_case("alt") {
            return None;
        }
        let value = (2..=4)
            .find_map(|i| caps.get(i))
            .map_or("", |m| m.as_str());
        Some((caps.get(0)?.range(), value))
    })
}

/// Whether a single `<img>` tag carries a non-empty alt attribute
pub fn image_has_alt(tag: &str) -> bool {
    alt_attribute(tag).is_some_and(|(_, value)| !value.trim().is_empty())
}

/// Every image element carries a non-empty alt attribute
pub fn all_images_have_alt(text: &str) -> bool {
    IMG_TAG.find_iter(text).all(|tag| image_has_alt(tag.as_str()))
}

/// Heading levels (1-6) in document order
pub fn heading_levels(text: &str) -> Vec<u8> {
    HEADING_TAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Levels may repeat, return to any shallower level, or nest exactly one deeper
pub fn hierarchy_is_valid(levels: &[u8]) -> bool {
    let mut previous: Option<u8> = None;
    for &level in levels {
        if let Some(prev) = previous {
            if level > prev + 1 {
                return false;
            }
        }
        previous = Some(level);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{all_rules, rule_for};

    fn doc(text: &str) -> Document {
        Document::new("test.html", text)
    }

    #[test]
    fn test_concrete_markup_satisfies_rule() {
        let d = doc(r#"<head><meta name="description" content="x"></head>"#);
        assert!(detect(&d, rule_for(RuleKey::MetaDescription)));
        assert!(!detect(&d, rule_for(RuleKey::MetaKeywords)));
    }

    #[test]
    fn test_single_quoted_attributes() {
        let d = doc("<link rel='canonical' href='https://example.com/'>");
        assert!(detect(&d, rule_for(RuleKey::Canonical)));
    }

    #[test]
    fn test_placeholder_directive_satisfies_rule() {
        let blade = doc("<head>@yield('title')\n@section(\"og_image\", $img)</head>");
        assert!(detect(&blade, rule_for(RuleKey::Title)));
        assert!(detect(&blade, rule_for(RuleKey::OgImage)));
        assert!(!detect(&blade, rule_for(RuleKey::OgTitle)));

        let block = doc("<head>{% block canonical_url %}{% endblock %}</head>");
        assert!(detect(&block, rule_for(RuleKey::Canonical)));
    }

    #[test]
    fn test_placeholder_uses_logical_field_name() {
        // canonical defers through canonical_url, not the rule key
        let d = doc("@yield('canonical')");
        assert!(!detect(&d, rule_for(RuleKey::Canonical)));

        let d = doc("@yield('schema')");
        assert!(detect(&d, rule_for(RuleKey::SchemaJson)));
    }

    #[test]
    fn test_structural_rules_ignore_placeholders() {
        let d = doc("@yield('viewport') @yield('language')<html><head></head></html>");
        assert!(!detect(&d, rule_for(RuleKey::Viewport)));
        assert!(!detect(&d, rule_for(RuleKey::Language)));

        let d = doc(r#"<html lang="de"><head><meta name="viewport" content="width=device-width"></head></html>"#);
        assert!(detect(&d, rule_for(RuleKey::Viewport)));
        assert!(detect(&d, rule_for(RuleKey::Language)));
    }

    #[test]
    fn test_has_markup_ignores_placeholders() {
        let text = "@yield('meta_robots')";
        assert!(detect_key(text, RuleKey::MetaRobots));
        assert!(!has_markup(text, RuleKey::MetaRobots));
    }

    #[test]
    fn test_preconnect_accepts_dns_prefetch() {
        let d = doc(r#"<link rel="dns-prefetch" href="//cdn.example.com">"#);
        assert!(detect(&d, rule_for(RuleKey::Preconnect)));
    }

    #[test]
    fn test_language_alternates_need_hreflang() {
        let with = doc(r#"<link rel="alternate" hreflang="es" href="/es">"#);
        let without = doc(r#"<link rel="alternate" type="application/rss+xml" href="/feed">"#);
        assert!(detect(&with, rule_for(RuleKey::LanguageAlternates)));
        assert!(!detect(&without, rule_for(RuleKey::LanguageAlternates)));
    }

    #[test]
    fn test_header_element_is_not_a_heading_or_title() {
        assert!(heading_levels("<header><hr></header>").is_empty());
        assert!(!detect_key("<titles>", RuleKey::Title));
    }

    #[test]
    fn test_image_alt_all_or_nothing() {
        let mixed = doc(r#"<img src="a.png" alt="x"><img src="b.png">"#);
        assert!(!detect(&mixed, rule_for(RuleKey::ImageAlt)));

        let all = doc(r#"<img src="a.png" alt="x"><img alt='y' src="b.png"/>"#);
        assert!(detect(&all, rule_for(RuleKey::ImageAlt)));

        let none = doc("<p>no images</p>");
        assert!(detect(&none, rule_for(RuleKey::ImageAlt)));
    }

    #[test]
    fn test_empty_or_blank_alt_is_a_violation() {
        assert!(!image_has_alt(r#"<img src="a.png" alt="">"#));
        assert!(!image_has_alt(r#"<img src="a.png" alt="   ">"#));
        assert!(!image_has_alt(r#"<img src="a.png" data-alt="x">"#));
        assert!(image_has_alt(r#"<img src="a.png" alt=logo>"#));
    }

    #[test]
    fn test_heading_sequences() {
        assert!(!hierarchy_is_valid(&[1, 2, 4]));
        assert!(hierarchy_is_valid(&[1, 2, 3]));
        assert!(hierarchy_is_valid(&[2, 2, 1, 2]));
        assert!(hierarchy_is_valid(&[3, 1, 2, 3, 3, 2]));
        assert!(hierarchy_is_valid(&[]));
        // a drop followed by a two-level climb is still a skip
        assert!(!hierarchy_is_valid(&[2, 2, 1, 3]));
    }

    #[test]
    fn test_heading_levels_in_document_order() {
        let text = r#"<h1>A</h1><h2 class="x">B</h2><h4>C</h4>"#;
        assert_eq!(heading_levels(text), vec![1, 2, 4]);
        assert!(!detect_key(text, RuleKey::HeadingsHierarchy));
        assert!(detect_key("<p>no headings</p>", RuleKey::HeadingsHierarchy));
    }

    #[test]
    fn test_rules_without_detector_fail_open() {
        let d = doc("");
        assert!(detect(&d, rule_for(RuleKey::ImageDimensions)));
        assert!(detect(&d, rule_for(RuleKey::DynamicPlaceholders)));
    }

    #[test]
    fn test_detection_is_total_on_garbage() {
        let garbage = doc("<<<meta name=\"<img <h9 <html lang <title\u{0}>>>\"");
        for rule in all_rules() {
            let _ = detect(&garbage, rule);
        }
    }

    #[test]
    fn test_quoted_greater_than_stays_inside_the_tag() {
        let blade = r#"<img src="{{ $post->image }}" alt="Cover">"#;
        assert!(detect_key(blade, RuleKey::ImageAlt));

        let meta = r#"<meta content="{{ $page->summary }}" name="description">"#;
        assert!(detect_key(meta, RuleKey::MetaDescription));

        let heading = r#"<h1 class="{{ $a->b }}">T</h1><h2>U</h2>"#;
        assert_eq!(heading_levels(heading), vec![1, 2]);
    }

    #[test]
    fn test_prefixed_attributes_do_not_match() {
        assert!(!detect_key(r#"<html data-lang="x">"#, RuleKey::Language));
        assert!(!detect_key(
            r#"<meta data-name="description" content="x">"#,
            RuleKey::MetaDescription
        ));
        // a signature inside another attribute's value is not the attribute
        assert!(!detect_key(
            r#"<meta content='name="robots"'>"#,
            RuleKey::MetaRobots
        ));
    }
}
