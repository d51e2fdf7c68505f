// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Markup documents handed to the engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A markup document: where it came from and its full text
///
/// The engine never edits a document in place; fixes return new text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub path: PathBuf,
    pub raw_text: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_text: raw_text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.raw_text
    }
}
