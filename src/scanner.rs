// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Document discovery
//!
//! Walks a project tree and collects the markup documents to audit. A file
//! qualifies when its name ends in one of the configured suffixes and its
//! path relative to the root matches none of the exclude globs.

use crate::config::ScanConfig;
use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Compiled scan settings
#[derive(Debug, Clone)]
pub struct Scanner {
    extensions: Vec<String>,
    exclude: GlobSet,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            extensions: config.extensions.clone(),
            exclude: builder.build()?,
        })
    }

    /// True when `path` has one of the scanned suffixes
    pub fn is_markup(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// True when `relative` (a path under the scan root) is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.is_match(relative)
    }

    /// Markup documents under `root`, sorted
    ///
    /// A root that is itself a file yields just that file when it qualifies.
    pub fn scan(&self, root: &Path) -> Vec<PathBuf> {
        info!("Scanning for documents: {}", root.display());

        if root.is_file() {
            return if self.is_markup(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            };
        }

        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.is_markup(path))
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                let excluded = self.is_excluded(relative);
                if excluded {
                    debug!("Excluded: {}", relative.display());
                }
                !excluded
            })
            .collect();

        found.sort();
        info!("Found {} documents", found.len());
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn test_scan_finds_markup_and_skips_excluded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "index.html");
        touch(dir.path(), "about.htm");
        touch(dir.path(), "resources/views/home.blade.php");
        touch(dir.path(), "resources/views/vendor/pager.blade.php");
        touch(dir.path(), "resources/views/mail/welcome.blade.php");
        touch(dir.path(), "app/Http/Controller.php");
        touch(dir.path(), "node_modules/pkg/readme.html");

        let scanner = Scanner::new(&ScanConfig::default()).unwrap();
        let found: Vec<PathBuf> = scanner
            .scan(dir.path())
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("about.htm"),
                PathBuf::from("index.html"),
                PathBuf::from("resources/views/home.blade.php"),
            ]
        );
    }

    #[test]
    fn test_single_file_root() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "page.html");
        touch(dir.path(), "notes.txt");

        let scanner = Scanner::new(&ScanConfig::default()).unwrap();
        assert_eq!(scanner.scan(&dir.path().join("page.html")).len(), 1);
        assert!(scanner.scan(&dir.path().join("notes.txt")).is_empty());
    }

    #[test]
    fn test_scan_nonexistent_dir() {
        let scanner = Scanner::new(&ScanConfig::default()).unwrap();
        assert!(scanner.scan(Path::new("/nonexistent/path")).is_empty());
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let config = ScanConfig {
            exclude: vec!["[unclosed".to_string()],
            ..ScanConfig::default()
        };
        assert!(Scanner::new(&config).is_err());
    }
}
