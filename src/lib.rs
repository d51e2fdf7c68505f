// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! seobot: rule-driven SEO audit and remediation
//!
//! This crate checks markup documents (plain HTML and server-side templates)
//! against a tiered catalog of SEO rules and repairs the mechanical gaps:
//!
//! - Tier A: the baseline every page needs (title, description, canonical, viewport, lang)
//! - Tier AA: social and accessibility signals (robots, Open Graph, alt text, headings)
//! - Tier AAA: advanced extras (structured data, icons, preconnect, hreflang)
//!
//! A rule passes when its concrete markup is present or when the template
//! fills it through a placeholder directive (`@section`, `@yield`, `{% block %}`).
//!
//! Part of the Hyperpolymath Gitbot Fleet.

pub mod batch;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod document;
pub mod error;
pub mod fixer;
pub mod report;
pub mod scanner;
pub mod store;

pub use batch::{
    audit_corpus, audit_documents, fix_documents, AuditRecord, BatchOptions, FixRecord,
};
pub use catalog::{all_rules, rule_for, rules_for_tier, Rule, RuleKey, Tier};
pub use classifier::{audit, classify, AuditReport, Finding, Verdict};
pub use config::Config;
pub use detector::detect;
pub use document::Document;
pub use error::{Result, SeobotError};
pub use fixer::{apply_fixes, parse_fix_keys, FixKey, FixOptions, FixOutcome, Fixer};
pub use scanner::Scanner;
pub use store::{BackupSink, DocumentStore, FsBackupStore, FsStore, MemoryStore};
