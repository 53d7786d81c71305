// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Statement-stream helpers: skip rules, error classification, and the
//! script hash recorded in migration history.

use sha2::{Digest, Sha256};

/// Error substrings that abort the run's transaction.
///
/// Matching is case-insensitive substring containment against the backend's
/// error text. Anything else is accumulated as a non-critical error and the
/// run continues.
const CRITICAL_ERRORS: [&str; 8] = [
    "syntax error",
    "table doesn't exist",
    "column doesn't exist",
    "duplicate column",
    "duplicate key",
    "foreign key constraint fails",
    "data too long",
    "out of range",
];

/// Whether a statement is a blank line or a `--` comment and should not be
/// sent to the database.
#[must_use]
pub(crate) fn should_skip(statement: &str) -> bool {
    let trimmed: &str = statement.trim();
    trimmed.is_empty() || trimmed.starts_with("--")
}

/// Whether an execution error aborts the transaction.
#[must_use]
pub(crate) fn is_critical_error(message: &str) -> bool {
    let lowered: String = message.to_lowercase();
    CRITICAL_ERRORS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

/// The 32-character script hash stored in the history row.
///
/// First 32 lower-hex characters of the SHA-256 digest of the statements
/// joined by newlines.
#[must_use]
pub(crate) fn script_hash(statements: &[String]) -> String {
    let script: String = statements.join("\n");
    let digest = Sha256::digest(script.as_bytes());
    hex::encode(digest)[..32].to_string()
}
