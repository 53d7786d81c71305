// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! MySQL/MariaDB catalog introspection.
//!
//! Assembles the run's [`RemoteSchema`] from `information_schema`. All
//! queries are raw SQL with explicit lower-case aliases so the row structs
//! deserialize by name on both MySQL and MariaDB.

use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::{MysqlConnection, QueryableByName, RunQueryDsl};
use tracing::debug;

use crate::error::MigrationError;
use crate::remote::{
    RemoteColumn, RemoteForeignKey, RemoteIndex, RemoteSchema, RemoteTable,
};

#[derive(QueryableByName)]
struct TableRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Nullable<Text>)]
    engine: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    charset: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    collation: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    table_comment: Option<String>,
}

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    column_type: String,
    #[diesel(sql_type = Text)]
    is_nullable: String,
    #[diesel(sql_type = Nullable<Text>)]
    column_default: Option<String>,
    #[diesel(sql_type = Text)]
    column_key: String,
    #[diesel(sql_type = Text)]
    extra: String,
    #[diesel(sql_type = Text)]
    column_comment: String,
    #[diesel(sql_type = Nullable<Text>)]
    charset: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    collation: Option<String>,
}

#[derive(QueryableByName)]
struct IndexRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    index_name: String,
    #[diesel(sql_type = BigInt)]
    non_unique: i64,
    #[diesel(sql_type = Text)]
    column_name: String,
}

#[derive(QueryableByName)]
struct ForeignKeyRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    constraint_name: String,
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    referenced_table_name: String,
    #[diesel(sql_type = Text)]
    referenced_column_name: String,
}

/// Takes the full catalog snapshot for one database.
///
/// # Errors
///
/// Returns `Introspection` when any catalog query fails.
pub(crate) fn remote_schema(
    conn: &mut MysqlConnection,
    database: &str,
) -> Result<RemoteSchema, MigrationError> {
    let mut schema: RemoteSchema = RemoteSchema::new();

    let tables: Vec<TableRow> = diesel::sql_query(
        "SELECT T.TABLE_NAME AS table_name, T.ENGINE AS engine, \
         CCSA.CHARACTER_SET_NAME AS charset, T.TABLE_COLLATION AS collation, \
         T.TABLE_COMMENT AS table_comment \
         FROM information_schema.TABLES T \
         LEFT JOIN information_schema.COLLATION_CHARACTER_SET_APPLICABILITY CCSA \
           ON CCSA.COLLATION_NAME = T.TABLE_COLLATION \
         WHERE T.TABLE_SCHEMA = ? \
         ORDER BY T.TABLE_NAME",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))?;

    for table in tables {
        schema.insert(RemoteTable {
            name: table.table_name,
            engine: table.engine,
            charset: table.charset,
            collation: table.collation,
            comment: table.table_comment.unwrap_or_default(),
            ..RemoteTable::default()
        });
    }

    load_columns(conn, database, &mut schema)?;
    load_indexes(conn, database, &mut schema)?;
    load_foreign_keys(conn, database, &mut schema)?;

    debug!("Introspected {} tables from '{}'", schema.len(), database);
    Ok(schema)
}

fn load_columns(
    conn: &mut MysqlConnection,
    database: &str,
    schema: &mut RemoteSchema,
) -> Result<(), MigrationError> {
    let columns: Vec<ColumnRow> = diesel::sql_query(
        "SELECT TABLE_NAME AS table_name, COLUMN_NAME AS column_name, \
         COLUMN_TYPE AS column_type, IS_NULLABLE AS is_nullable, \
         COLUMN_DEFAULT AS column_default, COLUMN_KEY AS column_key, \
         EXTRA AS extra, COLUMN_COMMENT AS column_comment, \
         CHARACTER_SET_NAME AS charset, COLLATION_NAME AS collation \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = ? \
         ORDER BY TABLE_NAME, ORDINAL_POSITION",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))?;

    for row in columns {
        let Some(table) = schema.get_mut(&row.table_name) else {
            continue;
        };

        let column: RemoteColumn = RemoteColumn {
            name: row.column_name,
            column_type: row.column_type,
            nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
            default: row.column_default,
            column_key: row.column_key,
            extra: row.extra,
            comment: row.column_comment,
            charset: row.charset,
            collation: row.collation,
        };

        if column.is_primary_key() {
            table.primary_key.push(column.name.clone());
        }
        table.columns.push(column);
    }

    Ok(())
}

fn load_indexes(
    conn: &mut MysqlConnection,
    database: &str,
    schema: &mut RemoteSchema,
) -> Result<(), MigrationError> {
    let rows: Vec<IndexRow> = diesel::sql_query(
        "SELECT TABLE_NAME AS table_name, INDEX_NAME AS index_name, \
         NON_UNIQUE AS non_unique, COLUMN_NAME AS column_name \
         FROM information_schema.STATISTICS \
         WHERE TABLE_SCHEMA = ? AND INDEX_NAME != 'PRIMARY' \
         ORDER BY TABLE_NAME, INDEX_NAME, SEQ_IN_INDEX",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))?;

    for row in rows {
        let Some(table) = schema.get_mut(&row.table_name) else {
            continue;
        };

        if let Some(index) = table
            .indexes
            .iter_mut()
            .find(|i| i.name == row.index_name)
        {
            index.columns.push(row.column_name);
        } else {
            table.indexes.push(RemoteIndex {
                name: row.index_name,
                unique: row.non_unique == 0,
                columns: vec![row.column_name],
            });
        }
    }

    Ok(())
}

fn load_foreign_keys(
    conn: &mut MysqlConnection,
    database: &str,
    schema: &mut RemoteSchema,
) -> Result<(), MigrationError> {
    let rows: Vec<ForeignKeyRow> = foreign_key_rows(conn, database)?;

    for row in rows {
        let Some(table) = schema.get_mut(&row.table_name) else {
            continue;
        };
        table.foreign_keys.push(RemoteForeignKey {
            name: row.constraint_name,
            column: row.column_name,
            referenced_table: row.referenced_table_name,
            referenced_column: row.referenced_column_name,
        });
    }

    Ok(())
}

fn foreign_key_rows(
    conn: &mut MysqlConnection,
    database: &str,
) -> Result<Vec<ForeignKeyRow>, MigrationError> {
    diesel::sql_query(
        "SELECT TABLE_NAME AS table_name, CONSTRAINT_NAME AS constraint_name, \
         COLUMN_NAME AS column_name, REFERENCED_TABLE_NAME AS referenced_table_name, \
         REFERENCED_COLUMN_NAME AS referenced_column_name \
         FROM information_schema.KEY_COLUMN_USAGE \
         WHERE TABLE_SCHEMA = ? AND REFERENCED_TABLE_SCHEMA IS NOT NULL \
         ORDER BY TABLE_NAME, CONSTRAINT_NAME",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))
}

/// Flat foreign-key edges for `get_join_constraints`.
pub(crate) fn join_constraints(
    conn: &mut MysqlConnection,
    database: &str,
) -> Result<Vec<(String, String, String, String)>, MigrationError> {
    let rows: Vec<ForeignKeyRow> = foreign_key_rows(conn, database)?;
    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.table_name,
                r.column_name,
                r.referenced_table_name,
                r.referenced_column_name,
            )
        })
        .collect())
}
