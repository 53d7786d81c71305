// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! PostgreSQL catalog introspection.
//!
//! Assembles the run's [`RemoteSchema`] from `information_schema` and the
//! `pg_*` catalogs for one schema (normally `public`). The column
//! projection normalizes `udt_name` spellings into the surface types the
//! planner compares against (`int4` → `int`, `numeric(p,s)` →
//! `decimal(p,s)`, ...), and a `nextval(` default marks a column as
//! auto-increment the same way MySQL's `EXTRA` column does.

use diesel::sql_types::{Bool, Nullable, Text};
use diesel::{PgConnection, QueryableByName, RunQueryDsl};
use tracing::debug;

use crate::error::MigrationError;
use crate::remote::{
    EXTRA_AUTO_INCREMENT, RemoteColumn, RemoteForeignKey, RemoteIndex, RemoteSchema, RemoteTable,
};

#[derive(QueryableByName)]
struct TableRow {
    #[diesel(sql_type = Text)]
    table_name: String,
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
    #[diesel(sql_type = Bool)]
    is_primary: bool,
    #[diesel(sql_type = Nullable<Text>)]
    column_comment: Option<String>,
}

#[derive(QueryableByName)]
struct IndexRow {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    index_name: String,
    #[diesel(sql_type = Bool)]
    is_unique: bool,
    #[diesel(sql_type = Nullable<Text>)]
    column_name: Option<String>,
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
    referenced_table: String,
    #[diesel(sql_type = Text)]
    referenced_column: String,
}

/// Takes the full catalog snapshot for one schema.
///
/// # Errors
///
/// Returns `Introspection` when any catalog query fails.
pub(crate) fn remote_schema(
    conn: &mut PgConnection,
    schema_name: &str,
) -> Result<RemoteSchema, MigrationError> {
    let mut schema: RemoteSchema = RemoteSchema::new();

    let tables: Vec<TableRow> = diesel::sql_query(
        "SELECT t.table_name AS table_name, \
         obj_description(format('%I.%I', t.table_schema, t.table_name)::regclass, 'pg_class') AS table_comment \
         FROM information_schema.tables t \
         WHERE t.table_schema = $1 AND t.table_type = 'BASE TABLE' \
         ORDER BY t.table_name",
    )
    .bind::<Text, _>(schema_name)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))?;

    for table in tables {
        schema.insert(RemoteTable {
            name: table.table_name,
            comment: table.table_comment.unwrap_or_default(),
            ..RemoteTable::default()
        });
    }

    load_columns(conn, schema_name, &mut schema)?;
    load_indexes(conn, schema_name, &mut schema)?;
    load_foreign_keys(conn, schema_name, &mut schema)?;

    debug!(
        "Introspected {} tables from schema '{}'",
        schema.len(),
        schema_name
    );
    Ok(schema)
}

fn load_columns(
    conn: &mut PgConnection,
    schema_name: &str,
    schema: &mut RemoteSchema,
) -> Result<(), MigrationError> {
    let columns: Vec<ColumnRow> = diesel::sql_query(
        "SELECT c.table_name AS table_name, c.column_name AS column_name, \
         CASE \
           WHEN c.udt_name = 'int2' THEN 'smallint' \
           WHEN c.udt_name = 'int4' THEN 'int' \
           WHEN c.udt_name = 'int8' THEN 'bigint' \
           WHEN c.udt_name = 'bpchar' THEN 'char(' || COALESCE(c.character_maximum_length::text, '') || ')' \
           WHEN c.udt_name = 'varchar' AND c.character_maximum_length IS NOT NULL \
             THEN 'varchar(' || c.character_maximum_length || ')' \
           WHEN c.udt_name = 'numeric' AND c.numeric_precision IS NOT NULL \
             THEN 'decimal(' || c.numeric_precision || ',' || COALESCE(c.numeric_scale, 0) || ')' \
           ELSE c.udt_name \
         END AS column_type, \
         c.is_nullable AS is_nullable, c.column_default AS column_default, \
         (pk.column_name IS NOT NULL) AS is_primary, \
         col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, c.ordinal_position::int) AS column_comment \
         FROM information_schema.columns c \
         LEFT JOIN ( \
           SELECT kcu.table_schema, kcu.table_name, kcu.column_name \
           FROM information_schema.table_constraints tc \
           JOIN information_schema.key_column_usage kcu \
             ON tc.constraint_name = kcu.constraint_name \
             AND tc.table_schema = kcu.table_schema \
             AND tc.table_name = kcu.table_name \
           WHERE tc.constraint_type = 'PRIMARY KEY' \
         ) pk ON pk.table_schema = c.table_schema \
             AND pk.table_name = c.table_name \
             AND pk.column_name = c.column_name \
         WHERE c.table_schema = $1 \
         ORDER BY c.table_name, c.ordinal_position",
    )
    .bind::<Text, _>(schema_name)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))?;

    for row in columns {
        let Some(table) = schema.get_mut(&row.table_name) else {
            continue;
        };

        let auto_increment: bool = row
            .column_default
            .as_deref()
            .is_some_and(|d| d.contains("nextval("));

        let column: RemoteColumn = RemoteColumn {
            name: row.column_name,
            column_type: row.column_type,
            nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
            default: row.column_default,
            column_key: if row.is_primary {
                String::from("PRI")
            } else {
                String::new()
            },
            extra: if auto_increment {
                String::from(EXTRA_AUTO_INCREMENT)
            } else {
                String::new()
            },
            comment: row.column_comment.unwrap_or_default(),
            charset: None,
            collation: None,
        };

        if column.is_primary_key() {
            table.primary_key.push(column.name.clone());
        }
        table.columns.push(column);
    }

    Ok(())
}

fn load_indexes(
    conn: &mut PgConnection,
    schema_name: &str,
    schema: &mut RemoteSchema,
) -> Result<(), MigrationError> {
    // Expression indexes (the fulltext GIN indexes) attribute no plain
    // columns; the LEFT JOIN keeps them visible so name matching works.
    let rows: Vec<IndexRow> = diesel::sql_query(
        "SELECT t.relname AS table_name, i.relname AS index_name, \
         ix.indisunique AS is_unique, a.attname AS column_name \
         FROM pg_index ix \
         JOIN pg_class t ON t.oid = ix.indrelid \
         JOIN pg_class i ON i.oid = ix.indexrelid \
         JOIN pg_namespace n ON n.oid = t.relnamespace \
         LEFT JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) ON TRUE \
         LEFT JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
         WHERE n.nspname = $1 AND t.relkind = 'r' AND NOT ix.indisprimary \
         ORDER BY t.relname, i.relname, k.ord",
    )
    .bind::<Text, _>(schema_name)
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
            if let Some(column) = row.column_name {
                index.columns.push(column);
            }
        } else {
            table.indexes.push(RemoteIndex {
                name: row.index_name,
                unique: row.is_unique,
                columns: row.column_name.into_iter().collect(),
            });
        }
    }

    Ok(())
}

fn load_foreign_keys(
    conn: &mut PgConnection,
    schema_name: &str,
    schema: &mut RemoteSchema,
) -> Result<(), MigrationError> {
    let rows: Vec<ForeignKeyRow> = foreign_key_rows(conn, schema_name)?;

    for row in rows {
        let Some(table) = schema.get_mut(&row.table_name) else {
            continue;
        };
        table.foreign_keys.push(RemoteForeignKey {
            name: row.constraint_name,
            column: row.column_name,
            referenced_table: row.referenced_table,
            referenced_column: row.referenced_column,
        });
    }

    Ok(())
}

fn foreign_key_rows(
    conn: &mut PgConnection,
    schema_name: &str,
) -> Result<Vec<ForeignKeyRow>, MigrationError> {
    // Only single-column constraints come back; the engine never emits
    // composite foreign keys.
    diesel::sql_query(
        "SELECT src.relname AS table_name, con.conname AS constraint_name, \
         a.attname AS column_name, dst.relname AS referenced_table, \
         af.attname AS referenced_column \
         FROM pg_constraint con \
         JOIN pg_class src ON src.oid = con.conrelid \
         JOIN pg_class dst ON dst.oid = con.confrelid \
         JOIN pg_namespace n ON n.oid = src.relnamespace \
         JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = con.conkey[1] \
         JOIN pg_attribute af ON af.attrelid = con.confrelid AND af.attnum = con.confkey[1] \
         WHERE con.contype = 'f' AND n.nspname = $1 \
         ORDER BY src.relname, con.conname",
    )
    .bind::<Text, _>(schema_name)
    .load(conn)
    .map_err(|e| MigrationError::Introspection(e.to_string()))
}

/// Flat foreign-key edges for `get_join_constraints`.
pub(crate) fn join_constraints(
    conn: &mut PgConnection,
    schema_name: &str,
) -> Result<Vec<(String, String, String, String)>, MigrationError> {
    let rows: Vec<ForeignKeyRow> = foreign_key_rows(conn, schema_name)?;
    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.table_name,
                r.column_name,
                r.referenced_table,
                r.referenced_column,
            )
        })
        .collect())
}
