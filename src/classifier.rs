// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Compliance classification
//!
//! Runs every rule in scope against one document, records a [`Finding`] per
//! failed rule and folds the findings into a single [`Verdict`]:
//!
//! - any tier A finding makes the document non-compliant, permanently;
//! - the first AA or AAA finding drops a compliant document to "AA";
//! - further AA/AAA findings leave an "AA" verdict where it is.

use crate::catalog::{rules_for_tier, Rule, RuleKey, Tier};
use crate::detector::detect;
use crate::document::Document;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// A rule the document failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub rule_key: RuleKey,
    pub display_name: &'static str,
    pub tier: Tier,
    pub fixable: bool,
}

impl From<&Rule> for Finding {
    fn from(rule: &Rule) -> Self {
        Self {
            rule_key: rule.key,
            display_name: rule.display_name,
            tier: rule.tier,
            fixable: rule.fixable,
        }
    }
}

/// Overall compliance of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No findings; labeled with the tier the audit ran at
    Compliant(Tier),
    /// Only AA/AAA findings
    Partial,
    /// At least one tier A finding
    NonCompliant,
}

impl Verdict {
    fn rank(self) -> u8 {
        match self {
            Verdict::NonCompliant => 0,
            Verdict::Partial => 1,
            Verdict::Compliant(_) => 2,
        }
    }

    /// Apply one finding of `tier` to the current verdict
    pub fn downgrade(self, tier: Tier) -> Verdict {
        match (self, tier) {
            (_, Tier::A) => Verdict::NonCompliant,
            (Verdict::Compliant(_), Tier::AA | Tier::AAA) => Verdict::Partial,
            (current, _) => current,
        }
    }

    pub fn is_compliant(self) -> bool {
        matches!(self, Verdict::Compliant(_))
    }

    /// True when `self` is no better than `other`
    pub fn is_at_most(self, other: Verdict) -> bool {
        self.rank() <= other.rank()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Compliant(tier) => write!(f, "{}", tier),
            Verdict::Partial => write!(f, "AA"),
            Verdict::NonCompliant => write!(f, "Non-compliant"),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Audit result for one document
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
    /// No findings at the requested tier; an "AA" verdict alone cannot tell
    pub compliant: bool,
}

impl AuditReport {
    pub fn fixable_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.fixable)
    }

    pub fn has_finding(&self, key: RuleKey) -> bool {
        self.findings.iter().any(|f| f.rule_key == key)
    }
}

/// Classify `document` against `rules`, in the order given
pub fn classify(document: &Document, rules: &[&Rule], requested: Tier) -> AuditReport {
    let mut findings = Vec::new();
    let mut verdict = Verdict::Compliant(requested);

    for rule in rules {
        if !detect(document, rule) {
            findings.push(Finding::from(*rule));
            verdict = verdict.downgrade(rule.tier);
        }
    }

    AuditReport {
        path: document.path.clone(),
        findings,
        compliant: verdict.is_compliant(),
        verdict,
    }
}

/// Audit `document` against every rule in scope for `tier`
pub fn audit(document: &Document, tier: Tier) -> AuditReport {
    classify(document, &rules_for_tier(tier), tier)
}
