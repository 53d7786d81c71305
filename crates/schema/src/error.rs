// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors raised while validating a model descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The descriptor has no table name.
    MissingTableName,
    /// The descriptor declares no columns.
    NoColumns(String),
    /// A column name appears more than once in the descriptor.
    DuplicateColumn { table: String, column: String },
    /// A column has an empty name.
    UnnamedColumn(String),
    /// An index references a column the descriptor does not declare.
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },
    /// An index declares no columns.
    EmptyIndex { table: String, index: String },
    /// A column is auto-increment but not an integer primary key.
    InvalidAutoIncrement { table: String, column: String },
    /// A foreign-key target is neither `table` nor `table.column`.
    InvalidForeignKey {
        table: String,
        column: String,
        target: String,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTableName => write!(f, "Model descriptor has no table name"),
            Self::NoColumns(table) => {
                write!(f, "Model descriptor for '{table}' declares no columns")
            }
            Self::DuplicateColumn { table, column } => {
                write!(f, "Duplicate column '{column}' in model '{table}'")
            }
            Self::UnnamedColumn(table) => {
                write!(f, "Model '{table}' declares a column with an empty name")
            }
            Self::UnknownIndexColumn {
                table,
                index,
                column,
            } => {
                write!(
                    f,
                    "Index '{index}' on model '{table}' references unknown column '{column}'"
                )
            }
            Self::EmptyIndex { table, index } => {
                write!(f, "Index '{index}' on model '{table}' declares no columns")
            }
            Self::InvalidAutoIncrement { table, column } => {
                write!(
                    f,
                    "Column '{column}' on model '{table}' is auto-increment but not an integer primary key"
                )
            }
            Self::InvalidForeignKey {
                table,
                column,
                target,
            } => {
                write!(
                    f,
                    "Column '{column}' on model '{table}' has invalid foreign-key target '{target}' (expected 'table' or 'table.column')"
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}
