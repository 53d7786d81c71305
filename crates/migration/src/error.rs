// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use altar_schema::SchemaError;

/// Errors that can occur during a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// The connection's driver has no registered dialect.
    UnsupportedDriver(String),
    /// A dialect was handed a connection for a different backend.
    DialectMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// Establishing the database connection failed.
    ConnectionFailed(String),
    /// The advisory migration lock could not be acquired.
    LockUnavailable(String),
    /// A catalog introspection query failed.
    Introspection(String),
    /// A generated or user-supplied statement failed.
    Statement { statement: String, message: String },
    /// A migration-history read or write failed.
    History(String),
    /// A model descriptor failed validation at registration.
    Schema(SchemaError),
    /// A general database error occurred.
    Database(String),
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedDriver(driver) => {
                write!(f, "No dialect registered for driver '{driver}'")
            }
            Self::DialectMismatch { expected, actual } => {
                write!(
                    f,
                    "Dialect expects a {expected} connection but was given {actual}"
                )
            }
            Self::ConnectionFailed(msg) => write!(f, "Database connection failed: {msg}"),
            Self::LockUnavailable(msg) => {
                write!(f, "Could not acquire migration lock: {msg}")
            }
            Self::Introspection(msg) => write!(f, "Schema introspection failed: {msg}"),
            Self::Statement { statement, message } => {
                write!(f, "Statement failed: {message} (statement: {statement})")
            }
            Self::History(msg) => write!(f, "Migration history error: {msg}"),
            Self::Schema(err) => write!(f, "Invalid model descriptor: {err}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<SchemaError> for MigrationError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl From<diesel::result::Error> for MigrationError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<diesel::ConnectionError> for MigrationError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}
