// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Remote schema snapshot.
//!
//! The introspectors assemble one [`RemoteSchema`] per migration run from
//! the backend's catalog views. It mirrors the shape of model descriptors
//! so the planners can diff the two directly, and it is treated as
//! read-only for the rest of the run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Marker value in [`RemoteColumn::column_key`] for primary-key columns.
pub const COLUMN_KEY_PRIMARY: &str = "PRI";

/// Marker substring in [`RemoteColumn::extra`] for auto-increment columns.
pub const EXTRA_AUTO_INCREMENT: &str = "auto_increment";

/// One column as reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteColumn {
    pub name: String,
    /// The surface type (`varchar(255)`, `int`, `decimal(10,2)`, ...).
    pub column_type: String,
    pub nullable: bool,
    /// The raw catalog default, `None` when the column has none.
    pub default: Option<String>,
    /// `PRI` for primary-key columns, empty otherwise.
    pub column_key: String,
    /// Catalog extras; contains `auto_increment` for serial columns.
    pub extra: String,
    pub comment: String,
    pub charset: Option<String>,
    pub collation: Option<String>,
}

impl RemoteColumn {
    /// Whether the catalog marks this column as part of the primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.column_key == COLUMN_KEY_PRIMARY
    }

    /// Whether the catalog marks this column auto-increment.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.extra
            .to_lowercase()
            .contains(EXTRA_AUTO_INCREMENT)
    }
}

/// One secondary index as reported by the catalog.
///
/// Primary-key indexes are excluded at introspection time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIndex {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// One single-column foreign-key constraint as reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteForeignKey {
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// One table as reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTable {
    pub name: String,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    /// The table comment, which doubles as the per-table version slot.
    pub comment: String,
    pub columns: Vec<RemoteColumn>,
    /// Ordered primary-key column names, assembled separately so
    /// primary-key drift is detectable without scanning the column list.
    pub primary_key: Vec<String>,
    pub indexes: Vec<RemoteIndex>,
    pub foreign_keys: Vec<RemoteForeignKey>,
}

impl RemoteTable {
    /// Looks up a column case-insensitively.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&RemoteColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Looks up an index by name, optionally case-insensitively.
    #[must_use]
    pub fn find_index(&self, name: &str, case_insensitive: bool) -> Option<&RemoteIndex> {
        self.indexes.iter().find(|i| {
            if case_insensitive {
                i.name.eq_ignore_ascii_case(name)
            } else {
                i.name == name
            }
        })
    }

    /// Whether an equivalent foreign key (same column and target) already
    /// exists on the table.
    #[must_use]
    pub fn has_foreign_key(&self, name: &str, column: &str, table: &str, referenced: &str) -> bool {
        self.foreign_keys.iter().any(|fk| {
            fk.name.eq_ignore_ascii_case(name)
                || (fk.column.eq_ignore_ascii_case(column)
                    && fk.referenced_table.eq_ignore_ascii_case(table)
                    && fk.referenced_column.eq_ignore_ascii_case(referenced))
        })
    }
}

/// The full catalog snapshot taken at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSchema {
    tables: HashMap<String, RemoteTable>,
}

impl RemoteSchema {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Inserts a table, keyed by its lower-cased name.
    pub fn insert(&mut self, table: RemoteTable) {
        self.tables.insert(table.name.to_lowercase(), table);
    }

    /// Looks up a table case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RemoteTable> {
        self.tables.get(&name.to_lowercase())
    }

    /// Mutable lookup used while the introspector is still assembling.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut RemoteTable> {
        self.tables.get_mut(&name.to_lowercase())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// One `(table, column) → (referenced_table, referenced_column)` edge, the
/// shape consumed by hosts that build join metadata from live constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConstraint {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}
