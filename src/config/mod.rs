// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration for seobot

use crate::batch::default_concurrency;
use crate::catalog::Tier;
use crate::error::{Result, SeobotError};
use crate::fixer::FixOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub compliance: ComplianceConfig,
    pub fixes: FixConfig,
    /// Documents audited or fixed at the same time
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File name suffixes treated as markup documents
    pub extensions: Vec<String>,
    /// Glob patterns, relative to the scan root, that are never scanned
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    pub default_level: Tier,
    /// Exit non-zero when any document is not fully compliant
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    pub create_backups: bool,
    /// Backup directory; relative paths resolve against the scan root
    pub backup_path: PathBuf,
    pub language: String,
    pub alt_text: String,
    pub site_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            compliance: ComplianceConfig::default(),
            fixes: FixConfig::default(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec![
                ".html".to_string(),
                ".htm".to_string(),
                ".blade.php".to_string(),
            ],
            exclude: vec![
                "**/vendor/**".to_string(),
                "**/mail/**".to_string(),
                "**/errors/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/.git/**".to_string(),
                "**/target/**".to_string(),
            ],
        }
    }
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            default_level: Tier::AAA,
            strict: false,
        }
    }
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            create_backups: true,
            backup_path: PathBuf::from("storage/seo-backups"),
            language: "en".to_string(),
            alt_text: "Image".to_string(),
            site_url: String::new(),
        }
    }
}

impl FixConfig {
    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            language: self.language.clone(),
            alt_text: self.alt_text.clone(),
            site_url: self.site_url.clone(),
        }
    }

    /// Where backups go for a scan rooted at `root`
    pub fn backup_dir(&self, root: &Path) -> PathBuf {
        if self.backup_path.is_absolute() {
            return self.backup_path.clone();
        }
        // a single-file root keeps its backups next to it
        let base = if root.is_file() {
            root.parent().unwrap_or(Path::new("."))
        } else {
            root
        };
        base.join(&self.backup_path)
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.scan.extensions.is_empty() {
            return Err(SeobotError::Config(
                "scan.extensions must list at least one suffix".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(SeobotError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("seobot")
        .join("config.yml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = if is_toml(path) {
        toml::from_str(&content)
            .map_err(|e| SeobotError::Config(format!("TOML parse error: {}", e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| SeobotError::Config(format!("YAML parse error: {}", e)))?
    };

    config.validate()?;
    Ok(config)
}

pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, render_config(&config, is_toml(path))?)?;
    Ok(())
}

/// Serialize a config as TOML or YAML
pub fn render_config(config: &Config, as_toml: bool) -> Result<String> {
    if as_toml {
        toml::to_string_pretty(config)
            .map_err(|e| SeobotError::Config(format!("TOML serialize error: {}", e)))
    } else {
        Ok(serde_yaml::to_string(config)?)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}
