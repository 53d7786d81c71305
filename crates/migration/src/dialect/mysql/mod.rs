// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! MySQL/MariaDB dialect.
//!
//! Identifier quoting with backticks, `information_schema` introspection,
//! `GET_LOCK`-based advisory locking with a 120-second wait, and the table
//! comment as the per-table version slot. The MariaDB flavor (recorded in
//! the configuration map at connect time) selects the MariaDB type
//! substitutions during planning.

mod introspect;
pub(crate) mod plan;

use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::{MysqlConnection, QueryableByName, RunQueryDsl};
use tracing::{debug, warn};

use altar_schema::{INITIAL_VERSION, ModelDescriptor, config};

use crate::connection::SchemaConnection;
use crate::dialect::{
    MIGRATION_LOCK, MigrationOptions, MigrationPlan, SchemaDialect, TablePlan,
};
use crate::error::MigrationError;
use crate::history::{HISTORY_TABLE, HistoryRow, NewHistoryRow};
use crate::remote::{JoinConstraint, RemoteSchema};

/// Registry name of this dialect.
pub const NAME: &str = "mysql";

/// Seconds `GET_LOCK` waits before giving up.
const LOCK_WAIT_SECONDS: u32 = 120;

#[derive(QueryableByName)]
struct DatabaseRow {
    #[diesel(sql_type = Nullable<Text>)]
    db: Option<String>,
}

#[derive(QueryableByName)]
struct LockRow {
    #[diesel(sql_type = Nullable<BigInt>)]
    locked: Option<i64>,
}

#[derive(QueryableByName)]
struct CommentRow {
    #[diesel(sql_type = Nullable<Text>)]
    table_comment: Option<String>,
}

#[derive(QueryableByName)]
struct HistoryRecord {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    hash: String,
    #[diesel(sql_type = Text)]
    status: String,
    #[diesel(sql_type = Integer)]
    executed_queries: i32,
    #[diesel(sql_type = Nullable<Text>)]
    error_message: Option<String>,
    #[diesel(sql_type = Text)]
    created_at: String,
}

/// The MySQL/MariaDB dialect.
#[derive(Debug, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Factory registered in the dialect registry.
    #[must_use]
    pub fn boxed() -> Box<dyn SchemaDialect> {
        Box::new(Self::new())
    }

    fn mariadb() -> bool {
        config::mysql_engine().eq_ignore_ascii_case("mariadb")
    }
}

impl SchemaDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        NAME
    }

    fn quote(&self, identifier: &str) -> String {
        plan::quote(identifier)
    }

    fn current_database(&self, conn: &mut SchemaConnection) -> Result<String, MigrationError> {
        let row: DatabaseRow = diesel::sql_query("SELECT DATABASE() AS db")
            .get_result(conn.mysql()?)
            .map_err(|e| MigrationError::Introspection(e.to_string()))?;
        row.db
            .ok_or_else(|| MigrationError::Introspection(String::from("no database selected")))
    }

    fn generate_migration(
        &mut self,
        conn: &mut SchemaConnection,
        database: &str,
        descriptors: &[ModelDescriptor],
        options: &MigrationOptions,
    ) -> Result<MigrationPlan, MigrationError> {
        let remote: RemoteSchema = introspect::remote_schema(conn.mysql()?, database)?;
        let mariadb: bool = Self::mariadb();
        let mut migration: MigrationPlan = MigrationPlan::default();

        for descriptor in descriptors {
            migration
                .table_exists
                .insert(descriptor.table().to_string(), remote.contains(descriptor.table()));

            let mut table_plan: TablePlan =
                plan::plan_table(descriptor, descriptors, &remote, options, mariadb);
            migration.queries.append(&mut table_plan.queries);
            migration.tail.append(&mut table_plan.tail);
        }

        Ok(migration)
    }

    fn get_table_version(
        &self,
        conn: &mut SchemaConnection,
        database: &str,
        table: &str,
    ) -> Result<String, MigrationError> {
        let rows: Vec<CommentRow> = diesel::sql_query(
            "SELECT TABLE_COMMENT AS table_comment FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(table)
        .load(conn.mysql()?)
        .map_err(|e| MigrationError::Introspection(e.to_string()))?;

        let version: String = rows
            .into_iter()
            .next()
            .and_then(|row| row.table_comment)
            .filter(|comment| !comment.is_empty())
            .unwrap_or_else(|| String::from(INITIAL_VERSION));

        debug!("Table '{}' is at version {}", table, version);
        Ok(version)
    }

    fn set_table_version_sql(&self, table: &str, version: &str) -> String {
        format!(
            "ALTER TABLE {} COMMENT = '{}';",
            plan::quote(table),
            version.replace('\'', "''")
        )
    }

    fn get_join_constraints(
        &self,
        conn: &mut SchemaConnection,
        database: &str,
    ) -> Result<Vec<JoinConstraint>, MigrationError> {
        let edges: Vec<(String, String, String, String)> =
            introspect::join_constraints(conn.mysql()?, database)?;

        Ok(edges
            .into_iter()
            .map(
                |(table, column, referenced_table, referenced_column)| JoinConstraint {
                    table,
                    column,
                    referenced_table,
                    referenced_column,
                },
            )
            .collect())
    }

    fn acquire_migration_lock(&self, conn: &mut SchemaConnection) -> Result<(), MigrationError> {
        let sql: String = format!("SELECT GET_LOCK('{MIGRATION_LOCK}', {LOCK_WAIT_SECONDS}) AS locked");
        let row: LockRow = diesel::sql_query(sql)
            .get_result(conn.mysql()?)
            .map_err(|e| MigrationError::LockUnavailable(e.to_string()))?;

        match row.locked {
            Some(1) => {
                debug!("Acquired migration lock '{}'", MIGRATION_LOCK);
                Ok(())
            }
            other => Err(MigrationError::LockUnavailable(format!(
                "GET_LOCK('{MIGRATION_LOCK}') returned {other:?} after {LOCK_WAIT_SECONDS}s"
            ))),
        }
    }

    fn release_migration_lock(&self, conn: &mut SchemaConnection) {
        let result: Result<&mut MysqlConnection, MigrationError> = conn.mysql();
        match result {
            Ok(mysql) => {
                let sql: String = format!("SELECT RELEASE_LOCK('{MIGRATION_LOCK}')");
                if let Err(err) = diesel::sql_query(sql).execute(mysql) {
                    warn!("Failed to release migration lock: {}", err);
                }
            }
            Err(err) => warn!("Failed to release migration lock: {}", err),
        }
    }

    fn bootstrap_history_table(&self, conn: &mut SchemaConnection) -> Result<(), MigrationError> {
        let sql: String = format!(
            "CREATE TABLE IF NOT EXISTS `{HISTORY_TABLE}` (
    `id` int NOT NULL AUTO_INCREMENT,
    `hash` char(32) NOT NULL,
    `status` varchar(16) NOT NULL,
    `executed_queries` int NOT NULL DEFAULT 0,
    `error_message` text NULL,
    `created_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (`id`)
) ENGINE=InnoDB;"
        );
        conn.batch_execute(&sql)
            .map_err(|e| MigrationError::History(e.to_string()))
    }

    fn insert_history_row(
        &self,
        conn: &mut SchemaConnection,
        row: &NewHistoryRow,
    ) -> Result<(), MigrationError> {
        diesel::sql_query(format!(
            "INSERT INTO `{HISTORY_TABLE}` (`hash`, `status`, `executed_queries`, `error_message`) \
             VALUES (?, ?, ?, ?)"
        ))
        .bind::<Text, _>(&row.hash)
        .bind::<Text, _>(row.status.as_str())
        .bind::<Integer, _>(row.executed_queries)
        .bind::<Nullable<Text>, _>(row.error_message.as_deref())
        .execute(conn.mysql()?)
        .map_err(|e| MigrationError::History(e.to_string()))?;
        Ok(())
    }

    fn list_history(&self, conn: &mut SchemaConnection) -> Result<Vec<HistoryRow>, MigrationError> {
        let rows: Vec<HistoryRecord> = diesel::sql_query(format!(
            "SELECT CAST(`id` AS SIGNED) AS id, `hash` AS hash, `status` AS status, \
             `executed_queries` AS executed_queries, `error_message` AS error_message, \
             CAST(`created_at` AS CHAR) AS created_at \
             FROM `{HISTORY_TABLE}` ORDER BY `id`"
        ))
        .load(conn.mysql()?)
        .map_err(|e| MigrationError::History(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| HistoryRow {
                id: r.id,
                hash: r.hash,
                status: r.status,
                executed_queries: r.executed_queries,
                error_message: r.error_message,
                created_at: r.created_at,
            })
            .collect())
    }
}
