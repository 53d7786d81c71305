// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Column descriptions.
//!
//! A [`Column`] is the logical description of one table column as the host
//! application wants it to exist: type, size, nullability, default,
//! key/uniqueness flags, foreign-key target, and the dialect-facing extras
//! (charset, collation, comment, `ON UPDATE` expression).
//!
//! Columns are built fluently and never mutated after registration:
//!
//! ```
//! use altar_schema::Column;
//!
//! let email: Column = Column::new("email", "varchar").size(255).unique().not_null();
//! assert_eq!(email.name(), "email");
//! assert!(email.is_unique());
//! ```

use serde::{Deserialize, Serialize};

/// Broad classification of a logical column type.
///
/// Families drive dialect decisions that do not care about the exact type:
/// serial selection for auto-increment columns, `USING` casts on PostgreSQL
/// type changes, and zero-default backfill for `NOT NULL` additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFamily {
    Integer,
    Decimal,
    Text,
    Boolean,
    Timestamp,
    Date,
    Json,
    Enum,
    Unknown,
}

impl TypeFamily {
    /// Classifies a logical type string.
    ///
    /// The type is lower-cased and any size suffix (`varchar(255)`,
    /// `int(11)`) is ignored before matching.
    #[must_use]
    pub fn of(type_name: &str) -> Self {
        let lowered: String = type_name.to_lowercase();
        let base: &str = lowered.split('(').next().unwrap_or("").trim();

        match base {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "serial"
            | "smallserial" | "bigserial" => Self::Integer,
            "decimal" | "numeric" | "float" | "double" | "real" => Self::Decimal,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "bpchar"
            | "character varying" | "character" => Self::Text,
            "bool" | "boolean" => Self::Boolean,
            "timestamp" | "timestamptz" | "datetime" => Self::Timestamp,
            "date" => Self::Date,
            "json" | "jsonb" => Self::Json,
            "enum" => Self::Enum,
            _ => Self::Unknown,
        }
    }
}

/// Logical description of a single table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    type_name: String,
    size: u32,
    precision: u32,
    scale: u32,
    /// Raw default value. `"NULL"` means an explicit null default; the
    /// empty string means no default was specified.
    default: String,
    nullable: bool,
    primary_key: bool,
    auto_increment: bool,
    unique: bool,
    fulltext: bool,
    enum_values: Vec<String>,
    foreign_key: Option<String>,
    on_delete: Option<String>,
    on_update: Option<String>,
    on_update_value: Option<String>,
    comment: String,
    charset: Option<String>,
    collation: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and logical type.
    ///
    /// Columns start out nullable with no default and no flags set.
    #[must_use]
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            size: 0,
            precision: 0,
            scale: 0,
            default: String::new(),
            nullable: true,
            primary_key: false,
            auto_increment: false,
            unique: false,
            fulltext: false,
            enum_values: Vec::new(),
            foreign_key: None,
            on_delete: None,
            on_update: None,
            on_update_value: None,
            comment: String::new(),
            charset: None,
            collation: None,
        }
    }

    /// Sets the column size (e.g. `varchar(255)`).
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets precision and scale (e.g. `decimal(10,2)`).
    #[must_use]
    pub const fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Sets the raw default value. Pass `"NULL"` for an explicit null.
    #[must_use]
    pub fn default_value(mut self, default: &str) -> Self {
        self.default = default.to_string();
        self
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column auto-increment.
    ///
    /// Auto-increment columns must also be integer primary keys; this is
    /// validated at descriptor registration.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Requests a unique index (`idx_unique_<column>`) over the column.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Flags the column for fulltext indexing.
    #[must_use]
    pub const fn fulltext(mut self) -> Self {
        self.fulltext = true;
        self
    }

    /// Sets the value set for an `enum` column.
    #[must_use]
    pub fn values(mut self, values: &[&str]) -> Self {
        self.enum_values = values.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the foreign-key target: `table` or `table.column`.
    ///
    /// A bare `table` resolves to that table's primary-key column at
    /// migration time.
    #[must_use]
    pub fn references(mut self, target: &str) -> Self {
        self.foreign_key = Some(target.to_string());
        self
    }

    /// Sets the referential `ON DELETE` action (defaults to `CASCADE`).
    #[must_use]
    pub fn on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }

    /// Sets the referential `ON UPDATE` action (defaults to `CASCADE`).
    #[must_use]
    pub fn on_update(mut self, action: &str) -> Self {
        self.on_update = Some(action.to_string());
        self
    }

    /// Sets an expression re-applied to the column on every row update
    /// (e.g. `CURRENT_TIMESTAMP`).
    ///
    /// MySQL renders this inline as `ON UPDATE <expr>`; PostgreSQL renders
    /// a trigger-function pair.
    #[must_use]
    pub fn on_update_value(mut self, expression: &str) -> Self {
        self.on_update_value = Some(expression.to_string());
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }

    /// Sets a per-column character set (MySQL only).
    #[must_use]
    pub fn charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }

    /// Sets a per-column collation (MySQL only).
    #[must_use]
    pub fn collation(mut self, collation: &str) -> Self {
        self.collation = Some(collation.to_string());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logical type string, as declared.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The type family of the logical type.
    #[must_use]
    pub fn family(&self) -> TypeFamily {
        TypeFamily::of(&self.type_name)
    }

    #[must_use]
    pub const fn get_size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub const fn get_precision(&self) -> u32 {
        self.precision
    }

    #[must_use]
    pub const fn get_scale(&self) -> u32 {
        self.scale
    }

    /// The raw default value; empty when unspecified.
    #[must_use]
    pub fn default(&self) -> &str {
        &self.default
    }

    /// Whether a default value was specified at all.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        !self.default.is_empty()
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[must_use]
    pub const fn is_auto_increment(&self) -> bool {
        self.auto_increment
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
    pub fn enum_values(&self) -> &[String] {
        &self.enum_values
    }

    #[must_use]
    pub fn foreign_key(&self) -> Option<&str> {
        self.foreign_key.as_deref()
    }

    #[must_use]
    pub fn on_delete_action(&self) -> Option<&str> {
        self.on_delete.as_deref()
    }

    #[must_use]
    pub fn on_update_action(&self) -> Option<&str> {
        self.on_update.as_deref()
    }

    #[must_use]
    pub fn on_update_expression(&self) -> Option<&str> {
        self.on_update_value.as_deref()
    }

    #[must_use]
    pub fn get_comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn get_charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    #[must_use]
    pub fn get_collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }
}
