// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Report generation for audit and fix results.
//!
//! Supports two output formats:
//! - Pretty: human-readable summary followed by one line per finding
//! - JSON: the per-document records, for programmatic consumption

use crate::batch::{AuditRecord, FixRecord};
use crate::catalog::Rule;
use crate::classifier::AuditReport;
use crate::error::Result;
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Pretty,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Corpus-wide audit totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub compliant: usize,
    pub with_issues: usize,
    pub issues: usize,
    pub fixable_issues: usize,
    /// Percentage of compliant documents, one decimal place
    pub score: f64,
}

impl Summary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a AuditReport>) -> Self {
        let mut summary = Summary {
            total: 0,
            compliant: 0,
            with_issues: 0,
            issues: 0,
            fixable_issues: 0,
            score: 0.0,
        };

        for report in reports {
            summary.total += 1;
            if report.findings.is_empty() {
                summary.compliant += 1;
            } else {
                summary.with_issues += 1;
            }
            summary.issues += report.findings.len();
            summary.fixable_issues += report.fixable_findings().count();
        }

        if summary.total > 0 {
            let ratio = summary.compliant as f64 / summary.total as f64 * 100.0;
            summary.score = (ratio * 10.0).round() / 10.0;
        }
        summary
    }

    pub fn grade(&self) -> &'static str {
        match self.score {
            s if s >= 90.0 => "Excellent",
            s if s >= 70.0 => "Good",
            s if s >= 50.0 => "Fair",
            _ => "Needs Work",
        }
    }
}

#[derive(Serialize)]
struct AuditOutput<'a> {
    summary: Summary,
    documents: &'a [AuditRecord],
}

#[derive(Serialize)]
struct FixOutput<'a> {
    modified: usize,
    errors: usize,
    documents: &'a [FixRecord],
}

/// Render audit records
pub fn render_audit(records: &[AuditRecord], format: OutputFormat) -> Result<String> {
    let summary = Summary::from_reports(records.iter().filter_map(|r| r.report.as_ref()));
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&AuditOutput {
            summary,
            documents: records,
        })?),
        OutputFormat::Pretty => Ok(audit_text(records, &summary)),
    }
}

fn audit_text(records: &[AuditRecord], summary: &Summary) -> String {
    let mut output = String::new();

    output.push_str("=== SEO Compliance Report ===\n\n");
    output.push_str(&format!("Documents scanned:  {}\n", summary.total));
    output.push_str(&format!("Fully compliant:    {}\n", summary.compliant));
    output.push_str(&format!("With issues:        {}\n", summary.with_issues));
    output.push_str(&format!(
        "Total issues:       {} ({} fixable)\n",
        summary.issues, summary.fixable_issues
    ));
    output.push_str(&format!(
        "Score:              {:.1}% ({})\n",
        summary.score,
        summary.grade()
    ));

    for record in records {
        if let Some(ref error) = record.error {
            output.push_str(&format!("\n{}\n  error: {}\n", record.path.display(), error));
            continue;
        }
        let Some(ref report) = record.report else {
            continue;
        };
        if report.findings.is_empty() {
            continue;
        }

        output.push_str(&format!(
            "\n{} ({})\n",
            report.path.display(),
            report.verdict
        ));
        for finding in &report.findings {
            output.push_str(&format!(
                "  [{}] {} ({}){}\n",
                finding.tier,
                finding.display_name,
                finding.tier.label(),
                if finding.fixable { "  fixable" } else { "" }
            ));
        }
    }

    if summary.fixable_issues > 0 {
        output.push_str("\nRun `seobot fix --backup` to apply automatic fixes.\n");
    }

    output
}

/// Render fix records
pub fn render_fixes(records: &[FixRecord], format: OutputFormat) -> Result<String> {
    let modified = records.iter().filter(|r| r.written).count();
    let errors = records.iter().filter(|r| r.error.is_some()).count();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&FixOutput {
            modified,
            errors,
            documents: records,
        })?),
        OutputFormat::Pretty => {
            let mut output = String::new();
            for record in records {
                if let Some(ref error) = record.error {
                    output.push_str(&format!("✗ {}: {}\n", record.path.display(), error));
                    continue;
                }
                let Some(ref outcome) = record.outcome else {
                    continue;
                };
                if !outcome.changed {
                    continue;
                }
                let verb = if record.written { "fixed" } else { "would fix" };
                output.push_str(&format!(
                    "✓ {}: {} {} issue(s)",
                    record.path.display(),
                    verb,
                    outcome.fixes_applied
                ));
                if let Some(ref backup) = record.backup {
                    output.push_str(&format!(" (backup: {})", backup.display()));
                }
                output.push('\n');
            }
            output.push_str(&format!("\n{} files modified, {} errors\n", modified, errors));
            Ok(output)
        }
    }
}

/// Render catalog rules
pub fn render_rules(rules: &[&Rule], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rules)?),
        OutputFormat::Pretty => {
            let mut output = String::new();
            for rule in rules {
                output.push_str(&format!(
                    "{:<4} {:<22} {}{}\n",
                    rule.tier.to_string(),
                    rule.key.as_str(),
                    rule.display_name,
                    if rule.fixable { " (fixable)" } else { "" }
                ));
            }
            Ok(output)
        }
    }
}
