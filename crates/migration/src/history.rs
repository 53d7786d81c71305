// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Migration history records.
//!
//! Every run that reaches statement execution appends one row to the
//! `schema_migration` table: the script hash, the outcome, the number of
//! statements that executed, and any error text. The table itself is
//! bootstrapped idempotently by the dialect before the run starts.

use serde::{Deserialize, Serialize};

/// Name of the history table.
pub const HISTORY_TABLE: &str = "schema_migration";

/// Outcome of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationStatus {
    Success,
    Failed,
}

impl MigrationStatus {
    /// The value stored in the history table's `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A history row about to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryRow {
    /// 32-character hash of the generated script.
    pub hash: String,
    pub status: MigrationStatus,
    /// Count of statements that executed successfully.
    pub executed_queries: i32,
    pub error_message: Option<String>,
}

/// A history row read back from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: i64,
    pub hash: String,
    pub status: String,
    pub executed_queries: i32,
    pub error_message: Option<String>,
    pub created_at: String,
}
