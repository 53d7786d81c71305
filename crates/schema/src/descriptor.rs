// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Model descriptors and the host-facing [`Model`] trait.
//!
//! A [`ModelDescriptor`] is the validated, in-memory description of one
//! table as the host application wants it: ordered columns, ordered
//! indexes, optional table attributes, and version-scoped migration
//! statements. Hosts either build descriptors directly with the fluent API
//! or implement [`Model`] on their own types and let registration convert
//! them via [`ModelDescriptor::from_model`].

use serde::{Deserialize, Serialize};

use crate::column::{Column, TypeFamily};
use crate::error::SchemaError;
use crate::index::Index;

/// A version-scoped migration statement attached to a model.
///
/// The statement applies when the stored table version is strictly lower
/// than `version`, or unconditionally when `version` is `*`. Wildcard
/// entries never advance the stored version, so they must be idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationEntry {
    version: String,
    sql: String,
}

impl MigrationEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(version: &str, sql: &str) -> Self {
        Self {
            version: version.to_string(),
            sql: sql.to_string(),
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Capability surface a host model exposes to the migration engine.
///
/// Only `table_name` and `columns` are required; everything else has a
/// do-nothing default. Registration reads the full surface once and turns
/// it into an immutable [`ModelDescriptor`].
pub trait Model {
    /// The table name this model maps to.
    fn table_name(&self) -> String;

    /// The ordered column list.
    fn columns(&self) -> Vec<Column>;

    /// Additional secondary indexes.
    fn indexes(&self) -> Vec<Index> {
        Vec::new()
    }

    /// Overrides the table engine (MySQL).
    fn table_engine(&self) -> Option<String> {
        None
    }

    /// Overrides the table character set (MySQL).
    fn table_charset(&self) -> Option<String> {
        None
    }

    /// Overrides the table collation (MySQL).
    fn table_collation(&self) -> Option<String> {
        None
    }

    /// Post-processes each column at registration time.
    fn column_definition(&self, _column: &mut Column) {}

    /// Version-scoped migration statements, in application order.
    fn migrations(&self) -> Vec<MigrationEntry> {
        Vec::new()
    }
}

/// Validated description of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    table: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    migrations: Vec<MigrationEntry>,
}

impl ModelDescriptor {
    /// Creates an empty descriptor for the given table.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
            migrations: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends a secondary index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Overrides the table engine (MySQL).
    #[must_use]
    pub fn engine(mut self, engine: &str) -> Self {
        self.engine = Some(engine.to_string());
        self
    }

    /// Overrides the table character set (MySQL).
    #[must_use]
    pub fn charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }

    /// Overrides the table collation (MySQL).
    #[must_use]
    pub fn collation(mut self, collation: &str) -> Self {
        self.collation = Some(collation.to_string());
        self
    }

    /// Appends a version-scoped migration statement.
    #[must_use]
    pub fn migration(mut self, version: &str, sql: &str) -> Self {
        self.migrations.push(MigrationEntry::new(version, sql));
        self
    }

    /// Builds a validated descriptor from any [`Model`] implementation.
    ///
    /// The model's `column_definition` callback is applied to every column,
    /// implicit `idx_unique_<column>` indexes are materialized for unique
    /// columns, and the descriptor invariants are checked.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when the model violates a descriptor
    /// invariant.
    pub fn from_model(model: &dyn Model) -> Result<Self, SchemaError> {
        let mut columns: Vec<Column> = model.columns();
        for column in &mut columns {
            model.column_definition(column);
        }

        let mut indexes: Vec<Index> = model.indexes();
        for column in &columns {
            if !column.is_unique() {
                continue;
            }
            let name: String = format!("idx_unique_{}", column.name());
            if indexes.iter().any(|index| index.name() == name) {
                continue;
            }
            indexes.push(Index::new(&name).unique().columns(&[column.name()]));
        }

        let descriptor: Self = Self {
            table: model.table_name(),
            columns,
            indexes,
            engine: model.table_engine(),
            charset: model.table_charset(),
            collation: model.table_collation(),
            migrations: model.migrations(),
        };

        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Checks the descriptor invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant:
    /// - the table name is non-empty and at least one column exists
    /// - column names are non-empty and unique (case-insensitive)
    /// - auto-increment columns are integer primary keys
    /// - foreign-key targets are `table` or `table.column`
    /// - every index has at least one column, all of which exist
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.table.is_empty() {
            return Err(SchemaError::MissingTableName);
        }
        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns(self.table.clone()));
        }

        let mut seen: Vec<String> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.name().is_empty() {
                return Err(SchemaError::UnnamedColumn(self.table.clone()));
            }
            let lowered: String = column.name().to_lowercase();
            if seen.contains(&lowered) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.table.clone(),
                    column: column.name().to_string(),
                });
            }
            seen.push(lowered);

            if column.is_auto_increment()
                && !(column.is_primary_key() && column.family() == TypeFamily::Integer)
            {
                return Err(SchemaError::InvalidAutoIncrement {
                    table: self.table.clone(),
                    column: column.name().to_string(),
                });
            }

            if let Some(target) = column.foreign_key() {
                let parts: Vec<&str> = target.split('.').collect();
                let valid: bool = match parts.as_slice() {
                    [table] => !table.is_empty(),
                    [table, col] => !table.is_empty() && !col.is_empty(),
                    _ => false,
                };
                if !valid {
                    return Err(SchemaError::InvalidForeignKey {
                        table: self.table.clone(),
                        column: column.name().to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }

        for index in &self.indexes {
            if index.column_names().is_empty() {
                return Err(SchemaError::EmptyIndex {
                    table: self.table.clone(),
                    index: index.name().to_string(),
                });
            }
            for column in index.column_names() {
                if !self
                    .columns
                    .iter()
                    .any(|c| c.name().eq_ignore_ascii_case(column))
                {
                    return Err(SchemaError::UnknownIndexColumn {
                        table: self.table.clone(),
                        index: index.name().to_string(),
                        column: column.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn get_columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn get_indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Looks up a column by name, case-insensitively.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// The ordered primary-key columns.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key()).collect()
    }

    #[must_use]
    pub fn get_engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    #[must_use]
    pub fn get_charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    #[must_use]
    pub fn get_collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    #[must_use]
    pub fn get_migrations(&self) -> &[MigrationEntry] {
        &self.migrations
    }
}

impl Model for ModelDescriptor {
    fn table_name(&self) -> String {
        self.table.clone()
    }

    fn columns(&self) -> Vec<Column> {
        self.columns.clone()
    }

    fn indexes(&self) -> Vec<Index> {
        self.indexes.clone()
    }

    fn table_engine(&self) -> Option<String> {
        self.engine.clone()
    }

    fn table_charset(&self) -> Option<String> {
        self.charset.clone()
    }

    fn table_collation(&self) -> Option<String> {
        self.collation.clone()
    }

    fn migrations(&self) -> Vec<MigrationEntry> {
        self.migrations.clone()
    }
}
