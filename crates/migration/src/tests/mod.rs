// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod backend_validation_tests;
mod fk_tests;
mod postgres_plan_tests;

use altar_schema::{Column, ModelDescriptor};

use crate::remote::{RemoteColumn, RemoteIndex, RemoteSchema, RemoteTable};

/// The `users` descriptor used across the planning tests (scenario S1).
pub fn users_descriptor() -> ModelDescriptor {
    ModelDescriptor::from_model(
        &ModelDescriptor::new("users")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(Column::new("email", "varchar").size(255).unique().not_null())
            .column(
                Column::new("created_at", "timestamp")
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP"),
            ),
    )
    .expect("users descriptor is valid")
}

/// A remote snapshot of `users` that matches [`users_descriptor`] exactly,
/// as a MySQL catalog would report it.
pub fn users_remote_mysql() -> RemoteTable {
    RemoteTable {
        name: String::from("users"),
        engine: Some(String::from("InnoDB")),
        charset: Some(String::from("utf8mb4")),
        collation: Some(String::from("utf8mb4_unicode_ci")),
        comment: String::from("0.0.0"),
        columns: vec![
            RemoteColumn {
                name: String::from("id"),
                column_type: String::from("int(11)"),
                nullable: false,
                default: None,
                column_key: String::from("PRI"),
                extra: String::from("auto_increment"),
                ..RemoteColumn::default()
            },
            RemoteColumn {
                name: String::from("email"),
                column_type: String::from("varchar(255)"),
                nullable: false,
                default: None,
                ..RemoteColumn::default()
            },
            RemoteColumn {
                name: String::from("created_at"),
                column_type: String::from("timestamp"),
                nullable: false,
                default: Some(String::from("CURRENT_TIMESTAMP")),
                ..RemoteColumn::default()
            },
        ],
        primary_key: vec![String::from("id")],
        indexes: vec![RemoteIndex {
            name: String::from("idx_unique_email"),
            unique: true,
            columns: vec![String::from("email")],
        }],
        foreign_keys: Vec::new(),
    }
}

/// The same matching snapshot with PostgreSQL type spellings.
pub fn users_remote_postgres() -> RemoteTable {
    let mut table: RemoteTable = users_remote_mysql();
    table.engine = None;
    table.charset = None;
    table.collation = None;
    table.columns[0].column_type = String::from("int");
    table.columns[0].default = Some(String::from("nextval('users_id_seq'::regclass)"));
    table.columns[2].default = Some(String::from("now()"));
    table
}

/// Wraps remote tables into a schema.
pub fn schema_of(tables: Vec<RemoteTable>) -> RemoteSchema {
    let mut schema: RemoteSchema = RemoteSchema::new();
    for table in tables {
        schema.insert(table);
    }
    schema
}

/// Finds the first statement containing a fragment, panicking with the
/// full statement list when nothing matches.
pub fn find_statement<'a>(statements: &'a [String], fragment: &str) -> &'a String {
    statements
        .iter()
        .find(|s| s.contains(fragment))
        .unwrap_or_else(|| panic!("no statement contains '{fragment}' in {statements:#?}"))
}

/// Asserts that no statement contains a fragment.
pub fn assert_no_statement(statements: &[String], fragment: &str) {
    assert!(
        !statements.iter().any(|s| s.contains(fragment)),
        "unexpected statement containing '{fragment}' in {statements:#?}"
    );
}

/// The executable (non-comment, non-blank) statements of a plan.
pub fn executable(statements: &[String]) -> Vec<&String> {
    statements
        .iter()
        .filter(|s| {
            let trimmed: &str = s.trim();
            !trimmed.is_empty() && !trimmed.starts_with("--")
        })
        .collect()
}
