// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rule catalog
//!
//! The catalog is a static table of every SEO element seobot knows how to
//! look for. Rules are grouped into three cumulative compliance tiers:
//!
//! | Tier | Meaning  | Examples                                  |
//! |------|----------|-------------------------------------------|
//! | A    | Critical | title, meta description, viewport, lang   |
//! | AA   | Important| robots, Open Graph, image alt, headings   |
//! | AAA  | Advanced | JSON-LD, keywords, favicon, hreflang      |
//!
//! Auditing at a tier checks that tier and every tier below it.

use crate::error::SeobotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compliance tier, ordered from least to most strict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Critical baseline
    A,
    /// Important
    AA,
    /// Advanced
    AAA,
}

impl Tier {
    /// All tiers, least strict first
    pub const ALL: [Tier; 3] = [Tier::A, Tier::AA, Tier::AAA];

    /// Human-readable importance label
    pub fn label(self) -> &'static str {
        match self {
            Tier::A => "Critical",
            Tier::AA => "Important",
            Tier::AAA => "Advanced",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::A => write!(f, "A"),
            Tier::AA => write!(f, "AA"),
            Tier::AAA => write!(f, "AAA"),
        }
    }
}

impl FromStr for Tier {
    type Err = SeobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Tier::A),
            "AA" => Ok(Tier::AA),
            "AAA" => Ok(Tier::AAA),
            _ => Err(SeobotError::InvalidTier(s.to_string())),
        }
    }
}

/// Identifier of a catalog rule
///
/// Variant order matches the layout of the catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKey {
    Title,
    MetaDescription,
    Canonical,
    Viewport,
    Language,
    MetaRobots,
    OgTitle,
    OgDescription,
    OgImage,
    TwitterCard,
    ImageAlt,
    HeadingsHierarchy,
    SchemaJson,
    MetaKeywords,
    Preconnect,
    ImageDimensions,
    DynamicPlaceholders,
    Favicon,
    AppleTouchIcon,
    LanguageAlternates,
}

impl RuleKey {
    /// Stable snake_case key used in reports and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKey::Title => "title",
            RuleKey::MetaDescription => "meta_description",
            RuleKey::Canonical => "canonical",
            RuleKey::Viewport => "viewport",
            RuleKey::Language => "language",
            RuleKey::MetaRobots => "meta_robots",
            RuleKey::OgTitle => "og_title",
            RuleKey::OgDescription => "og_description",
            RuleKey::OgImage => "og_image",
            RuleKey::TwitterCard => "twitter_card",
            RuleKey::ImageAlt => "image_alt",
            RuleKey::HeadingsHierarchy => "headings_hierarchy",
            RuleKey::SchemaJson => "schema_json",
            RuleKey::MetaKeywords => "meta_keywords",
            RuleKey::Preconnect => "preconnect",
            RuleKey::ImageDimensions => "image_dimensions",
            RuleKey::DynamicPlaceholders => "dynamic_placeholders",
            RuleKey::Favicon => "favicon",
            RuleKey::AppleTouchIcon => "apple_touch_icon",
            RuleKey::LanguageAlternates => "language_alternates",
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKey {
    type Err = SeobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RULES
            .iter()
            .map(|rule| rule.key)
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SeobotError::UnknownIssue(s.to_string()))
    }
}

/// A single detectable SEO element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub key: RuleKey,
    pub tier: Tier,
    pub display_name: &'static str,
    pub fixable: bool,
}

const fn rule(key: RuleKey, tier: Tier, display_name: &'static str, fixable: bool) -> Rule {
    Rule {
        key,
        tier,
        display_name,
        fixable,
    }
}

/// Every rule, grouped by tier in scan order
static RULES: [Rule; 20] = [
    rule(RuleKey::Title, Tier::A, "Title tag", false),
    rule(RuleKey::MetaDescription, Tier::A, "Meta description", false),
    rule(RuleKey::Canonical, Tier::A, "Canonical URL", true),
    rule(RuleKey::Viewport, Tier::A, "Viewport meta tag", true),
    rule(RuleKey::Language, Tier::A, "HTML lang attribute", true),
    rule(RuleKey::MetaRobots, Tier::AA, "Robots meta tag", true),
    rule(RuleKey::OgTitle, Tier::AA, "Open Graph title", false),
    rule(RuleKey::OgDescription, Tier::AA, "Open Graph description", false),
    rule(RuleKey::OgImage, Tier::AA, "Open Graph image", false),
    rule(RuleKey::TwitterCard, Tier::AA, "Twitter card", false),
    rule(RuleKey::ImageAlt, Tier::AA, "Image alt attributes", true),
    rule(RuleKey::HeadingsHierarchy, Tier::AA, "Heading hierarchy", false),
    rule(RuleKey::SchemaJson, Tier::AAA, "Schema.org JSON-LD", false),
    rule(RuleKey::MetaKeywords, Tier::AAA, "Meta keywords", false),
    rule(RuleKey::Preconnect, Tier::AAA, "Preconnect/DNS prefetch", true),
    rule(RuleKey::ImageDimensions, Tier::AAA, "Image width and height attributes", false),
    rule(RuleKey::DynamicPlaceholders, Tier::AAA, "Dynamic placeholders filled", false),
    rule(RuleKey::Favicon, Tier::AAA, "Favicon", true),
    rule(RuleKey::AppleTouchIcon, Tier::AAA, "Apple touch icon", true),
    rule(RuleKey::LanguageAlternates, Tier::AAA, "Hreflang tags", false),
];

/// All rules in the catalog
pub fn all_rules() -> &'static [Rule] {
    &RULES
}

/// Rules that must be checked to claim compliance at `tier`
///
/// Includes every rule of `tier` and of all tiers below it, A rules first.
pub fn rules_for_tier(tier: Tier) -> Vec<&'static Rule> {
    RULES.iter().filter(|rule| rule.tier <= tier).collect()
}

/// Look up a rule by key
pub fn rule_for(key: RuleKey) -> &'static Rule {
    // RULES is laid out in RuleKey declaration order
    &RULES[key as usize]
}
