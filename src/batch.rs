// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Bounded-concurrency batch driver
//!
//! Audits and fixes many documents at once. Each document is handled by a
//! blocking task on the tokio pool; a semaphore caps how many run together.
//! A failure on one document is recorded against that document and never
//! stops the rest of the batch. Results come back sorted by path.

use crate::catalog::Tier;
use crate::classifier::{audit, AuditReport};
use crate::document::Document;
use crate::error::Result;
use crate::fixer::{FixKey, FixOutcome, Fixer};
use crate::store::{BackupSink, DocumentStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// How a batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Documents processed at the same time (at least 1)
    pub concurrency: usize,
    /// Compute fixes without taking backups or writing anything
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            dry_run: false,
        }
    }
}

/// Number of CPUs available, or 4 when that cannot be determined
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Audit outcome for one document in a batch
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AuditReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fix outcome for one document in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FixRecord {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FixOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// True once the new text has been written back
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FixRecord {
    fn failed(path: PathBuf, outcome: Option<FixOutcome>, error: String) -> Self {
        Self {
            path,
            outcome,
            backup: None,
            written: false,
            error: Some(error),
        }
    }
}

/// Run `work` over `items` with at most `concurrency` running at once
async fn run_bounded<T, R, F>(items: Vec<T>, concurrency: usize, work: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let limit = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let work = Arc::new(work);
    let mut tasks = JoinSet::new();

    debug!(items = items.len(), limit, "Starting batch");

    for item in items {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let work = Arc::clone(&work);
        tasks.spawn_blocking(move || {
            let result = work(item);
            drop(permit);
            result
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    Ok(results)
}

/// Audit in-memory documents concurrently
pub async fn audit_corpus(
    documents: Vec<Document>,
    tier: Tier,
    concurrency: usize,
) -> Result<Vec<AuditReport>> {
    let mut reports = run_bounded(documents, concurrency, move |document| {
        audit(&document, tier)
    })
    .await?;
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(reports)
}

/// Read and audit documents from a store
pub async fn audit_documents(
    store: Arc<dyn DocumentStore>,
    paths: Vec<PathBuf>,
    tier: Tier,
    concurrency: usize,
) -> Result<Vec<AuditRecord>> {
    let mut records = run_bounded(paths, concurrency, move |path| {
        match store.read(&path) {
            Ok(text) => {
                let report = audit(&Document::new(path.clone(), text), tier);
                AuditRecord {
                    path,
                    report: Some(report),
                    error: None,
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not audit document");
                AuditRecord {
                    path,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        }
    })
    .await?;
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

/// Read, fix, back up and write documents from a store
///
/// Backups are taken only for documents whose text changed, and a document
/// is never written when its backup failed.
pub async fn fix_documents(
    store: Arc<dyn DocumentStore>,
    backups: Option<Arc<dyn BackupSink>>,
    paths: Vec<PathBuf>,
    keys: Vec<FixKey>,
    fixer: Arc<Fixer>,
    options: BatchOptions,
) -> Result<Vec<FixRecord>> {
    let dry_run = options.dry_run;
    let mut records = run_bounded(paths, options.concurrency, move |path| {
        fix_one(
            store.as_ref(),
            backups.as_deref(),
            &fixer,
            &keys,
            path,
            dry_run,
        )
    })
    .await?;
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

fn fix_one(
    store: &dyn DocumentStore,
    backups: Option<&dyn BackupSink>,
    fixer: &Fixer,
    keys: &[FixKey],
    path: PathBuf,
    dry_run: bool,
) -> FixRecord {
    let original = match store.read(&path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read document");
            return FixRecord::failed(path, None, e.to_string());
        }
    };

    let outcome = fixer.apply(&Document::new(path.clone(), original.as_str()), keys);
    if !outcome.changed || dry_run {
        return FixRecord {
            path,
            outcome: Some(outcome),
            backup: None,
            written: false,
            error: None,
        };
    }

    let backup = match backups.map(|sink| sink.save_backup(&path, original.as_bytes())) {
        Some(Ok(saved)) => Some(saved),
        Some(Err(e)) => {
            warn!(path = %path.display(), error = %e, "Backup failed, document left untouched");
            return FixRecord::failed(path, Some(outcome), e.to_string());
        }
        None => None,
    };

    if let Err(e) = store.write(&path, &outcome.new_text) {
        warn!(path = %path.display(), error = %e, "Could not write document");
        return FixRecord {
            backup,
            ..FixRecord::failed(path, Some(outcome), e.to_string())
        };
    }

    info!(
        path = %path.display(),
        fixes_applied = outcome.fixes_applied,
        backup_created = backup.is_some(),
        "Fixed document"
    );

    FixRecord {
        path,
        outcome: Some(outcome),
        backup,
        written: true,
        error: None,
    }
}

/// Paths of records whose document failed
pub fn failed_paths<'a>(records: impl IntoIterator<Item = &'a FixRecord>) -> Vec<&'a Path> {
    records
        .into_iter()
        .filter(|r| r.error.is_some())
        .map(|r| r.path.as_path())
        .collect()
}
