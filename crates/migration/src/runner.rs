// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Migration orchestration.
//!
//! [`Migrator`] owns the registered model descriptors and drives the run:
//! dialect detection, history-table bootstrap, advisory lock, introspection
//! and planning, per-model version migrations, transactional execution with
//! critical/non-critical error classification, history persistence, and
//! lock release. The pipeline is strictly sequential; cross-process mutual
//! exclusion comes from the dialect's advisory lock.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use altar_schema::{
    MigrationEntry, Model, ModelDescriptor, VERSION_WILDCARD, compare_versions,
};

use crate::connection::SchemaConnection;
use crate::dialect::{MigrationOptions, MigrationPlan, SchemaDialect, init_dialect};
use crate::error::MigrationError;
use crate::history::{MigrationStatus, NewHistoryRow};
use crate::statement::{is_critical_error, script_hash, should_skip};

/// Aggregate result of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub status: MigrationStatus,
    /// 32-character hash of the executed script.
    pub hash: String,
    /// Count of statements that executed successfully.
    pub executed_queries: i32,
    /// All collected error text, `None` on a clean run.
    pub error_message: Option<String>,
    /// Tables created by this run.
    pub created_tables: Vec<String>,
    /// Tables that already existed and were reconciled.
    pub altered_tables: Vec<String>,
}

impl MigrationReport {
    /// Whether the run completed without any statement errors.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.status, MigrationStatus::Success)
    }
}

/// Outcome of executing the statement stream.
struct ExecutionOutcome {
    executed: i32,
    errors: Vec<String>,
    aborted: bool,
}

/// The migration orchestrator.
///
/// Models are registered up front; `run` may then be invoked against any
/// supported connection. Registration and running must not overlap.
#[derive(Debug, Default)]
pub struct Migrator {
    descriptors: Vec<ModelDescriptor>,
    options: MigrationOptions,
}

impl Migrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an orchestrator with explicit run options.
    #[must_use]
    pub const fn with_options(options: MigrationOptions) -> Self {
        Self {
            descriptors: Vec::new(),
            options,
        }
    }

    /// Registers a model.
    ///
    /// The model is converted into a validated [`ModelDescriptor`] once;
    /// later mutations of the host value have no effect on the run.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError::Schema`] when the model violates a
    /// descriptor invariant.
    pub fn register(&mut self, model: &dyn Model) -> Result<(), MigrationError> {
        let descriptor: ModelDescriptor = ModelDescriptor::from_model(model)?;
        debug!("Registered model '{}'", descriptor.table());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// The registered descriptors, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.descriptors
    }

    /// Generates the combined statement list without executing anything.
    ///
    /// Takes the advisory lock for a consistent snapshot; writes no
    /// history.
    ///
    /// # Errors
    ///
    /// Returns configuration, lock, or introspection errors.
    pub fn script(&self, conn: &mut SchemaConnection) -> Result<Vec<String>, MigrationError> {
        let mut dialect: Box<dyn SchemaDialect> = init_dialect(conn)?;
        dialect.acquire_migration_lock(conn)?;

        let result: Result<Vec<String>, MigrationError> = self
            .assemble(conn, dialect.as_mut())
            .map(|(statements, _)| statements);

        dialect.release_migration_lock(conn);
        result
    }

    /// Runs the full migration pipeline.
    ///
    /// Statement failures do not surface as `Err`: the report carries the
    /// aggregate outcome and the history table records it. `Err` is
    /// reserved for configuration errors, lock acquisition failures, and
    /// introspection failures.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDriver` before anything else on an unknown
    /// driver, `LockUnavailable` when the advisory lock cannot be taken
    /// (no history row is written), and `Introspection` when the catalog
    /// cannot be read (a `failed` history row is written).
    pub fn run(&self, conn: &mut SchemaConnection) -> Result<MigrationReport, MigrationError> {
        let mut dialect: Box<dyn SchemaDialect> = init_dialect(conn)?;
        info!(
            "Starting migration of {} models via dialect '{}'",
            self.descriptors.len(),
            dialect.name()
        );

        dialect.bootstrap_history_table(conn)?;
        dialect.acquire_migration_lock(conn)?;

        let result: Result<MigrationReport, MigrationError> =
            self.run_locked(conn, dialect.as_mut());

        dialect.release_migration_lock(conn);
        result
    }

    fn run_locked(
        &self,
        conn: &mut SchemaConnection,
        dialect: &mut dyn SchemaDialect,
    ) -> Result<MigrationReport, MigrationError> {
        let (statements, plan) = match self.assemble(conn, dialect) {
            Ok(assembled) => assembled,
            Err(err) => {
                // Introspection and planning failures are recorded before
                // they propagate.
                let row: NewHistoryRow = NewHistoryRow {
                    hash: String::new(),
                    status: MigrationStatus::Failed,
                    executed_queries: 0,
                    error_message: Some(err.to_string()),
                };
                if let Err(history_err) = dialect.insert_history_row(conn, &row) {
                    warn!("Could not record failed migration: {}", history_err);
                }
                return Err(err);
            }
        };

        let hash: String = script_hash(&statements);
        let outcome: ExecutionOutcome = execute_statements(conn, &statements);
        if outcome.aborted {
            warn!(
                "Migration aborted after {} statement(s) and rolled back",
                outcome.executed
            );
        }

        let status: MigrationStatus = if outcome.errors.is_empty() {
            MigrationStatus::Success
        } else {
            MigrationStatus::Failed
        };
        let error_message: Option<String> = if outcome.errors.is_empty() {
            None
        } else {
            Some(outcome.errors.join("; "))
        };

        let row: NewHistoryRow = NewHistoryRow {
            hash: hash.clone(),
            status,
            executed_queries: outcome.executed,
            error_message: error_message.clone(),
        };
        if let Err(history_err) = dialect.insert_history_row(conn, &row) {
            // Never mask the migration result with a bookkeeping failure.
            warn!("Could not record migration history: {}", history_err);
        }

        let mut created_tables: Vec<String> = Vec::new();
        let mut altered_tables: Vec<String> = Vec::new();
        for descriptor in &self.descriptors {
            let existed: bool = plan
                .table_exists
                .get(descriptor.table())
                .copied()
                .unwrap_or(false);
            if existed {
                altered_tables.push(descriptor.table().to_string());
            } else {
                created_tables.push(descriptor.table().to_string());
            }
        }

        info!(
            "Migration finished: status={}, executed={} statement(s)",
            status, outcome.executed
        );

        Ok(MigrationReport {
            status,
            hash,
            executed_queries: outcome.executed,
            error_message,
            created_tables,
            altered_tables,
        })
    }

    /// Assembles the run's full statement list: the CREATE/ALTER pass,
    /// per-model version migrations, and the deferred foreign-key tail.
    fn assemble(
        &self,
        conn: &mut SchemaConnection,
        dialect: &mut dyn SchemaDialect,
    ) -> Result<(Vec<String>, MigrationPlan), MigrationError> {
        let database: String = dialect.current_database(conn)?;
        let plan: MigrationPlan =
            dialect.generate_migration(conn, &database, &self.descriptors, &self.options)?;

        let mut statements: Vec<String> = plan.queries.clone();

        for descriptor in &self.descriptors {
            let mut versioned: Vec<String> =
                version_statements(conn, dialect, &database, descriptor)?;
            statements.append(&mut versioned);
        }

        statements.extend(plan.tail.iter().cloned());
        Ok((statements, plan))
    }
}

/// Computes the version-gated statements for one model.
///
/// Entries strictly above the stored table version apply in input order; a
/// `*` tag applies unconditionally. The highest applied concrete tag is
/// written back into the table's version slot; if only `*` entries applied,
/// the stored version is left untouched.
fn version_statements(
    conn: &mut SchemaConnection,
    dialect: &mut dyn SchemaDialect,
    database: &str,
    descriptor: &ModelDescriptor,
) -> Result<Vec<String>, MigrationError> {
    let entries: &[MigrationEntry] = descriptor.get_migrations();
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let current: String = dialect.get_table_version(conn, database, descriptor.table())?;
    let (mut statements, highest) = gate_version_entries(entries, &current);

    if let Some(version) = highest {
        debug!(
            "Table '{}' advances from {} to {}",
            descriptor.table(),
            current,
            version
        );
        statements.push(dialect.set_table_version_sql(descriptor.table(), &version));
    }

    Ok(statements)
}

/// Selects the entries that apply against a stored version.
///
/// Returns the trimmed, `;`-terminated statements in input order plus the
/// highest concrete version among them (`*` entries apply but never count
/// as a version).
pub(crate) fn gate_version_entries(
    entries: &[MigrationEntry],
    current: &str,
) -> (Vec<String>, Option<String>) {
    let mut statements: Vec<String> = Vec::new();
    let mut highest: Option<String> = None;

    for entry in entries {
        let applies: bool = entry.version() == VERSION_WILDCARD
            || compare_versions(entry.version(), current) == Ordering::Greater;
        if !applies {
            continue;
        }

        let mut sql: String = entry.sql().trim().to_string();
        if !sql.ends_with(';') {
            sql.push(';');
        }
        statements.push(sql);

        if entry.version() != VERSION_WILDCARD {
            let is_higher: bool = highest
                .as_deref()
                .is_none_or(|h| compare_versions(entry.version(), h) == Ordering::Greater);
            if is_higher {
                highest = Some(entry.version().to_string());
            }
        }
    }

    (statements, highest)
}

/// Executes the statement stream inside one transaction.
///
/// Blank lines and `--` comments are skipped. A critical error aborts and
/// rolls back; non-critical errors accumulate and the stream continues.
fn execute_statements(conn: &mut SchemaConnection, statements: &[String]) -> ExecutionOutcome {
    let mut outcome: ExecutionOutcome = ExecutionOutcome {
        executed: 0,
        errors: Vec::new(),
        aborted: false,
    };

    if let Err(err) = conn.begin_transaction() {
        outcome.errors.push(err.to_string());
        outcome.aborted = true;
        return outcome;
    }

    for statement in statements {
        if should_skip(statement) {
            continue;
        }

        match conn.batch_execute(statement) {
            Ok(()) => outcome.executed += 1,
            Err(err) => {
                let message: String = err.to_string();
                if is_critical_error(&message) {
                    outcome
                        .errors
                        .push(format!("{message} (statement: {statement})"));
                    outcome.aborted = true;
                    break;
                }
                warn!("Statement failed (continuing): {}", message);
                outcome
                    .errors
                    .push(format!("{message} (statement: {statement})"));
            }
        }
    }

    if outcome.aborted {
        if let Err(err) = conn.rollback_transaction() {
            warn!("Rollback failed: {}", err);
        }
    } else if let Err(err) = conn.commit_transaction() {
        outcome.errors.push(err.to_string());
        outcome.aborted = true;
    }

    outcome
}
