// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-spanning connection wrapper.
//!
//! The engine works against one connection at a time, but the dialect it
//! talks through is chosen at runtime. [`SchemaConnection`] wraps the two
//! supported Diesel connections behind one type and exposes the handful of
//! operations the engine needs: raw statement execution, transaction
//! control, and the driver name used for dialect lookup.
//!
//! Establishing a MySQL connection probes `SELECT VERSION()` once and
//! records the engine flavor (`mysql` or `mariadb`) in the process-wide
//! configuration map; the MySQL dialect reads it back when normalizing
//! types.

use diesel::connection::SimpleConnection;
use diesel::sql_types::Text;
use diesel::{Connection, MysqlConnection, PgConnection, QueryableByName, RunQueryDsl};
use tracing::{debug, info};

use altar_schema::config;

use crate::error::MigrationError;

/// Driver name reported by MySQL/MariaDB connections.
pub const DRIVER_MYSQL: &str = "mysql";

/// Driver name reported by PostgreSQL connections.
pub const DRIVER_POSTGRES: &str = "postgres";

#[derive(QueryableByName)]
struct VersionRow {
    #[diesel(sql_type = Text)]
    version: String,
}

/// A live connection to one of the supported backends.
pub enum SchemaConnection {
    Mysql(MysqlConnection),
    Postgres(PgConnection),
}

impl SchemaConnection {
    /// Establishes a connection from a database URL.
    ///
    /// The backend is chosen by URL scheme: `mysql://` for MySQL/MariaDB,
    /// `postgres://` or `postgresql://` for PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDriver` for any other scheme and
    /// `ConnectionFailed` when the backend rejects the connection.
    pub fn establish(database_url: &str) -> Result<Self, MigrationError> {
        if database_url.starts_with("mysql://") {
            info!("Establishing MySQL connection");
            let mut conn: MysqlConnection = MysqlConnection::establish(database_url)?;
            record_mysql_flavor(&mut conn);
            return Ok(Self::Mysql(conn));
        }

        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            info!("Establishing PostgreSQL connection");
            let conn: PgConnection = PgConnection::establish(database_url)?;
            return Ok(Self::Postgres(conn));
        }

        let scheme: &str = database_url.split("://").next().unwrap_or(database_url);
        Err(MigrationError::UnsupportedDriver(scheme.to_string()))
    }

    /// The driver name used for dialect registry lookup.
    #[must_use]
    pub const fn driver_name(&self) -> &'static str {
        match self {
            Self::Mysql(_) => DRIVER_MYSQL,
            Self::Postgres(_) => DRIVER_POSTGRES,
        }
    }

    /// Executes a raw statement through the backend's simple query
    /// protocol.
    ///
    /// DDL and user-supplied migration statements go through this path
    /// rather than prepared statements, since not every DDL form is
    /// preparable on every backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub fn batch_execute(&mut self, sql: &str) -> Result<(), diesel::result::Error> {
        debug!("Executing: {}", sql);
        match self {
            Self::Mysql(conn) => conn.batch_execute(sql),
            Self::Postgres(conn) => conn.batch_execute(sql),
        }
    }

    /// Opens the run's transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the statement.
    pub fn begin_transaction(&mut self) -> Result<(), MigrationError> {
        self.batch_execute("BEGIN").map_err(MigrationError::from)
    }

    /// Commits the run's transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the statement.
    pub fn commit_transaction(&mut self) -> Result<(), MigrationError> {
        self.batch_execute("COMMIT").map_err(MigrationError::from)
    }

    /// Rolls the run's transaction back.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the statement.
    pub fn rollback_transaction(&mut self) -> Result<(), MigrationError> {
        self.batch_execute("ROLLBACK").map_err(MigrationError::from)
    }

    /// Borrows the underlying MySQL connection.
    ///
    /// # Errors
    ///
    /// Returns `DialectMismatch` when this is not a MySQL connection.
    pub fn mysql(&mut self) -> Result<&mut MysqlConnection, MigrationError> {
        match self {
            Self::Mysql(conn) => Ok(conn),
            Self::Postgres(_) => Err(MigrationError::DialectMismatch {
                expected: DRIVER_MYSQL,
                actual: DRIVER_POSTGRES,
            }),
        }
    }

    /// Borrows the underlying PostgreSQL connection.
    ///
    /// # Errors
    ///
    /// Returns `DialectMismatch` when this is not a PostgreSQL connection.
    pub fn postgres(&mut self) -> Result<&mut PgConnection, MigrationError> {
        match self {
            Self::Postgres(conn) => Ok(conn),
            Self::Mysql(_) => Err(MigrationError::DialectMismatch {
                expected: DRIVER_POSTGRES,
                actual: DRIVER_MYSQL,
            }),
        }
    }
}

/// Records the MySQL engine flavor in the configuration map.
///
/// A `VERSION()` reply containing `mariadb` (case-insensitive) selects the
/// MariaDB type substitutions during planning.
fn record_mysql_flavor(conn: &mut MysqlConnection) {
    let result: Result<VersionRow, diesel::result::Error> =
        diesel::sql_query("SELECT VERSION() AS version").get_result(conn);

    match result {
        Ok(row) => {
            let flavor: &str = if row.version.to_lowercase().contains("mariadb") {
                "mariadb"
            } else {
                "mysql"
            };
            info!("MySQL server version '{}', flavor '{}'", row.version, flavor);
            config::set(config::MYSQL_ENGINE, flavor);
        }
        Err(err) => {
            tracing::warn!("Could not probe MySQL server version: {}", err);
        }
    }
}
