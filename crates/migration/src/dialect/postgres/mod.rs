// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! PostgreSQL dialect.
//!
//! Identifier quoting with double quotes, `information_schema` + `pg_*`
//! catalog introspection over one schema (default `public`),
//! `pg_advisory_lock`-based locking (unbounded wait), and `COMMENT ON
//! TABLE` as the per-table version slot. The dialect instance carries the
//! per-run set of trigger-function names already emitted so `ON UPDATE`
//! trigger pairs are not duplicated within a run.

mod introspect;
pub(crate) mod plan;

use std::collections::HashSet;

use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::{PgConnection, QueryableByName, RunQueryDsl};
use tracing::{debug, warn};

use altar_schema::{INITIAL_VERSION, ModelDescriptor};

use crate::connection::SchemaConnection;
use crate::dialect::{
    MIGRATION_LOCK, MigrationOptions, MigrationPlan, SchemaDialect, TablePlan,
};
use crate::error::MigrationError;
use crate::history::{HISTORY_TABLE, HistoryRow, NewHistoryRow};
use crate::remote::{JoinConstraint, RemoteSchema};

/// Registry name of this dialect.
pub const NAME: &str = "postgres";

/// Schema introspected and targeted when the host does not override it.
const DEFAULT_SCHEMA: &str = "public";

#[derive(QueryableByName)]
struct DatabaseRow {
    #[diesel(sql_type = Text)]
    db: String,
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

/// The PostgreSQL dialect.
#[derive(Debug)]
pub struct PostgresDialect {
    schema: String,
    emitted_triggers: HashSet<String>,
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresDialect {
    #[must_use]
    pub fn new() -> Self {
        Self::with_schema(DEFAULT_SCHEMA)
    }

    /// Creates a dialect targeting a non-default schema.
    #[must_use]
    pub fn with_schema(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            emitted_triggers: HashSet::new(),
        }
    }

    /// Factory registered in the dialect registry.
    #[must_use]
    pub fn boxed() -> Box<dyn SchemaDialect> {
        Box::new(Self::new())
    }
}

impl SchemaDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        NAME
    }

    fn quote(&self, identifier: &str) -> String {
        plan::quote(identifier)
    }

    fn current_database(&self, conn: &mut SchemaConnection) -> Result<String, MigrationError> {
        let row: DatabaseRow = diesel::sql_query("SELECT current_database() AS db")
            .get_result(conn.postgres()?)
            .map_err(|e| MigrationError::Introspection(e.to_string()))?;
        Ok(row.db)
    }

    fn generate_migration(
        &mut self,
        conn: &mut SchemaConnection,
        _database: &str,
        descriptors: &[ModelDescriptor],
        options: &MigrationOptions,
    ) -> Result<MigrationPlan, MigrationError> {
        let remote: RemoteSchema = introspect::remote_schema(conn.postgres()?, &self.schema)?;
        let mut migration: MigrationPlan = MigrationPlan::default();

        for descriptor in descriptors {
            migration
                .table_exists
                .insert(descriptor.table().to_string(), remote.contains(descriptor.table()));

            let mut table_plan: TablePlan = plan::plan_table(
                descriptor,
                descriptors,
                &remote,
                options,
                &mut self.emitted_triggers,
            );
            migration.queries.append(&mut table_plan.queries);
            migration.tail.append(&mut table_plan.tail);
        }

        Ok(migration)
    }

    fn get_table_version(
        &self,
        conn: &mut SchemaConnection,
        _database: &str,
        table: &str,
    ) -> Result<String, MigrationError> {
        let rows: Vec<CommentRow> = diesel::sql_query(
            "SELECT d.description AS table_comment \
             FROM pg_class c \
             JOIN pg_namespace n ON n.oid = c.relnamespace \
             LEFT JOIN pg_description d ON d.objoid = c.oid AND d.objsubid = 0 \
             WHERE n.nspname = $1 AND c.relname = $2",
        )
        .bind::<Text, _>(&self.schema)
        .bind::<Text, _>(table)
        .load(conn.postgres()?)
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
            "COMMENT ON TABLE {} IS '{}';",
            plan::quote(table),
            version.replace('\'', "''")
        )
    }

    fn get_join_constraints(
        &self,
        conn: &mut SchemaConnection,
        _database: &str,
    ) -> Result<Vec<JoinConstraint>, MigrationError> {
        let edges: Vec<(String, String, String, String)> =
            introspect::join_constraints(conn.postgres()?, &self.schema)?;

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
        // pg_advisory_lock waits indefinitely; failure here means the
        // call itself was rejected, not a timeout.
        let sql: String = format!("SELECT pg_advisory_lock(hashtext('{MIGRATION_LOCK}'))");
        diesel::sql_query(sql)
            .execute(conn.postgres()?)
            .map_err(|e| MigrationError::LockUnavailable(e.to_string()))?;

        debug!("Acquired migration lock '{}'", MIGRATION_LOCK);
        Ok(())
    }

    fn release_migration_lock(&self, conn: &mut SchemaConnection) {
        let result: Result<&mut PgConnection, MigrationError> = conn.postgres();
        match result {
            Ok(postgres) => {
                let sql: String =
                    format!("SELECT pg_advisory_unlock(hashtext('{MIGRATION_LOCK}'))");
                if let Err(err) = diesel::sql_query(sql).execute(postgres) {
                    warn!("Failed to release migration lock: {}", err);
                }
            }
            Err(err) => warn!("Failed to release migration lock: {}", err),
        }
    }

    fn bootstrap_history_table(&self, conn: &mut SchemaConnection) -> Result<(), MigrationError> {
        let sql: String = format!(
            "CREATE TABLE IF NOT EXISTS \"{HISTORY_TABLE}\" (
    \"id\" BIGSERIAL PRIMARY KEY,
    \"hash\" CHAR(32) NOT NULL,
    \"status\" VARCHAR(16) NOT NULL,
    \"executed_queries\" INT NOT NULL DEFAULT 0,
    \"error_message\" TEXT NULL,
    \"created_at\" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);"
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
            "INSERT INTO \"{HISTORY_TABLE}\" (\"hash\", \"status\", \"executed_queries\", \"error_message\") \
             VALUES ($1, $2, $3, $4)"
        ))
        .bind::<Text, _>(&row.hash)
        .bind::<Text, _>(row.status.as_str())
        .bind::<Integer, _>(row.executed_queries)
        .bind::<Nullable<Text>, _>(row.error_message.as_deref())
        .execute(conn.postgres()?)
        .map_err(|e| MigrationError::History(e.to_string()))?;
        Ok(())
    }

    fn list_history(&self, conn: &mut SchemaConnection) -> Result<Vec<HistoryRow>, MigrationError> {
        let rows: Vec<HistoryRecord> = diesel::sql_query(format!(
            "SELECT \"id\" AS id, \"hash\"::text AS hash, \"status\" AS status, \
             \"executed_queries\" AS executed_queries, \"error_message\" AS error_message, \
             \"created_at\"::text AS created_at \
             FROM \"{HISTORY_TABLE}\" ORDER BY \"id\""
        ))
        .load(conn.postgres()?)
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
