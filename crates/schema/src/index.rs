// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Index descriptions and deterministic name constraining.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Logical description of a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    name: String,
    unique: bool,
    fulltext: bool,
    columns: Vec<String>,
}

impl Index {
    /// Creates a new index with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            unique: false,
            fulltext: false,
            columns: Vec::new(),
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index fulltext (MySQL `FULLTEXT`, PostgreSQL GIN over
    /// `to_tsvector`).
    #[must_use]
    pub const fn fulltext(mut self) -> Self {
        self.fulltext = true;
        self
    }

    /// Sets the ordered column list.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    #[must_use]
    pub const fn is_fulltext(&self) -> bool {
        self.fulltext
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }
}

/// Constrains an index name to a dialect's identifier length limit.
///
/// Names within the limit pass through unchanged. Longer names are truncated
/// to `limit - 9` characters and suffixed with `_` plus the first eight
/// lower-hex characters of the name's SHA-256 digest, so the result is stable
/// across runs and still unique per original name.
#[must_use]
pub fn constrain_index_name(name: &str, limit: usize) -> String {
    if name.chars().count() <= limit {
        return name.to_string();
    }

    let digest = Sha256::digest(name.as_bytes());
    let hash: String = hex::encode(digest);
    let head: String = name.chars().take(limit.saturating_sub(9)).collect();

    format!("{head}_{}", &hash[..8])
}
