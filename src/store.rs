// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Document and backup storage
//!
//! The engine itself only produces new text. Reading documents, writing fixed
//! documents back and keeping backups of the originals happen through the
//! [`DocumentStore`] and [`BackupSink`] traits so the batch driver can run
//! against the filesystem or an in-memory store.

use crate::error::{Result, SeobotError};
use chrono::Local;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Source and destination of document text
pub trait DocumentStore: Send + Sync {
    /// Read the full text of a document
    fn read(&self, path: &Path) -> Result<String>;

    /// Replace the text of a document
    fn write(&self, path: &Path, text: &str) -> Result<()>;
}

/// Keeps a recoverable copy of a document before it is modified
pub trait BackupSink: Send + Sync {
    /// Persist `original` for `path`, returning where the backup was stored
    fn save_backup(&self, path: &Path, original: &[u8]) -> Result<PathBuf>;
}

/// Documents on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|source| SeobotError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        std::fs::write(path, text).map_err(|source| SeobotError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Timestamped backup files in a single directory
///
/// A backup of `resources/views/home.blade.php` taken at 14:03:07 on
/// 2025-06-01 is stored as
/// `<dir>/resources_views_home.blade.php_2025-06-01_14-03-07.backup`.
#[derive(Debug, Clone)]
pub struct FsBackupStore {
    dir: PathBuf,
}

impl FsBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn backup_path(&self, path: &Path, timestamp: &str) -> PathBuf {
        let flattened: String = path
            .to_string_lossy()
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();

        let candidate = self.dir.join(format!("{}_{}.backup", flattened, timestamp));
        if !candidate.exists() {
            return candidate;
        }

        // several passes within one second get a numeric suffix
        (1..)
            .map(|n| {
                self.dir
                    .join(format!("{}_{}-{}.backup", flattened, timestamp, n))
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl BackupSink for FsBackupStore {
    fn save_backup(&self, path: &Path, original: &[u8]) -> Result<PathBuf> {
        let to_backup_error = |source| SeobotError::Backup {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(to_backup_error)?;

        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let target = self.backup_path(path, &timestamp);
        std::fs::write(&target, original).map_err(to_backup_error)?;

        debug!(source = %path.display(), backup = %target.display(), "Saved backup");
        Ok(target)
    }
}

/// In-memory documents and backups
///
/// Useful for embedding the engine where documents do not live on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<PathBuf, String>>,
    backups: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.lock_documents().insert(path.into(), text.into());
    }

    /// Current text of a document
    pub fn get(&self, path: &Path) -> Option<String> {
        self.lock_documents().get(path).cloned()
    }

    /// Paths of all stored documents, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock_documents().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Backups taken so far, in the order they were saved
    pub fn backups(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.backups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_documents(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| SeobotError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
        })
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        self.insert(path, text);
        Ok(())
    }
}

impl BackupSink for MemoryStore {
    fn save_backup(&self, path: &Path, original: &[u8]) -> Result<PathBuf> {
        let mut backups = self
            .backups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        backups.push((path.to_path_buf(), original.to_vec()));
        Ok(PathBuf::from(format!("memory://backup/{}", backups.len())))
    }
}
