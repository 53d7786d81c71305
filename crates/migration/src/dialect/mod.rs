// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dialect abstraction and registry.
//!
//! A dialect is the capability bundle that adapts the generic engine to one
//! database family: identifier quoting, catalog introspection, DDL
//! planning, per-table version tracking, advisory locking, and
//! migration-history persistence. MySQL/MariaDB and PostgreSQL are built
//! in; further dialects plug in through [`register_dialect`] without
//! touching the engine.
//!
//! ## Dialect-Specific Code
//!
//! Everything that cannot be expressed uniformly lives under the per-dialect
//! submodules (`mysql`, `postgres`), split into catalog introspection and
//! pure DDL planning. The planners never touch a connection, which is what
//! keeps the diff semantics unit-testable.

pub mod mysql;
pub mod postgres;

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use tracing::debug;

use altar_schema::ModelDescriptor;

use crate::connection::SchemaConnection;
use crate::error::MigrationError;
use crate::history::{HistoryRow, NewHistoryRow};
use crate::remote::JoinConstraint;

/// Name of the advisory lock serializing migration runs.
pub const MIGRATION_LOCK: &str = "schema_migration_lock";

/// Run flags handed down from the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Authorizes dropping remote-only columns and remote-only non-`fk_`
    /// indexes.
    pub strict: bool,
}

/// Output of a full introspection + planning pass over all descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Ordered CREATE/ALTER statements (with per-table comment headers).
    pub queries: Vec<String>,
    /// Deferred foreign-key tail, appended after every model's statements.
    pub tail: Vec<String>,
    /// Whether each registered table already existed remotely.
    pub table_exists: HashMap<String, bool>,
}

/// Statements planned for a single table: its CREATE/ALTER stream and its
/// contribution to the deferred foreign-key tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TablePlan {
    pub queries: Vec<String>,
    pub tail: Vec<String>,
}

/// The capability surface of one database family.
pub trait SchemaDialect: Send {
    /// Registry name (`mysql`, `postgres`).
    fn name(&self) -> &'static str;

    /// Quotes an identifier with the dialect's delimiter.
    fn quote(&self, identifier: &str) -> String;

    /// The active database (MySQL) or catalog (PostgreSQL) name.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup query fails.
    fn current_database(&self, conn: &mut SchemaConnection) -> Result<String, MigrationError>;

    /// Runs the full introspection + diff/create pass over all
    /// descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails.
    fn generate_migration(
        &mut self,
        conn: &mut SchemaConnection,
        database: &str,
        descriptors: &[ModelDescriptor],
        options: &MigrationOptions,
    ) -> Result<MigrationPlan, MigrationError>;

    /// Reads the per-table version from the table's comment slot,
    /// defaulting to `0.0.0` for absent tables or empty comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn get_table_version(
        &self,
        conn: &mut SchemaConnection,
        database: &str,
        table: &str,
    ) -> Result<String, MigrationError>;

    /// The statement that writes a version into the table's comment slot.
    fn set_table_version_sql(&self, table: &str, version: &str) -> String;

    /// Enumerates every single-column foreign-key edge in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn get_join_constraints(
        &self,
        conn: &mut SchemaConnection,
        database: &str,
    ) -> Result<Vec<JoinConstraint>, MigrationError>;

    /// Acquires the advisory migration lock.
    ///
    /// # Errors
    ///
    /// Returns `LockUnavailable` when the lock cannot be obtained within
    /// the dialect's wait policy.
    fn acquire_migration_lock(&self, conn: &mut SchemaConnection) -> Result<(), MigrationError>;

    /// Releases the advisory migration lock.
    ///
    /// Release never fails destructively; problems are logged and
    /// swallowed.
    fn release_migration_lock(&self, conn: &mut SchemaConnection);

    /// Idempotently creates the `schema_migration` history table.
    ///
    /// # Errors
    ///
    /// Returns an error if the create statement fails.
    fn bootstrap_history_table(&self, conn: &mut SchemaConnection) -> Result<(), MigrationError>;

    /// Appends one history row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_history_row(
        &self,
        conn: &mut SchemaConnection,
        row: &NewHistoryRow,
    ) -> Result<(), MigrationError>;

    /// Reads the full migration history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the select fails.
    fn list_history(&self, conn: &mut SchemaConnection) -> Result<Vec<HistoryRow>, MigrationError>;
}

type DialectFactory = fn() -> Box<dyn SchemaDialect>;

static REGISTRY: LazyLock<RwLock<HashMap<String, DialectFactory>>> = LazyLock::new(|| {
    let mut map: HashMap<String, DialectFactory> = HashMap::new();
    map.insert(String::from(mysql::NAME), mysql::MysqlDialect::boxed);
    map.insert(String::from(postgres::NAME), postgres::PostgresDialect::boxed);
    RwLock::new(map)
});

/// Registers a dialect factory under a driver name.
///
/// Registering over an existing name replaces it; the built-in dialects are
/// present from process start.
pub fn register_dialect(name: &str, factory: fn() -> Box<dyn SchemaDialect>) {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry.insert(name.to_string(), factory);
}

/// Resolves the dialect for a connection by its reported driver name.
///
/// # Errors
///
/// Returns `UnsupportedDriver` when no registered dialect matches; the
/// engine never falls back silently.
pub fn init_dialect(conn: &SchemaConnection) -> Result<Box<dyn SchemaDialect>, MigrationError> {
    let driver: &str = conn.driver_name();
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);

    registry.get(driver).map_or_else(
        || Err(MigrationError::UnsupportedDriver(driver.to_string())),
        |factory| {
            debug!("Resolved dialect '{}'", driver);
            Ok(factory())
        },
    )
}
