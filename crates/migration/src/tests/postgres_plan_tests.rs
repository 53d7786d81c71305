// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! PostgreSQL planning tests.

use std::collections::HashSet;

use altar_schema::{Column, Index, ModelDescriptor};

use crate::dialect::postgres::plan::{enum_type_name, normalize_type, plan_table};
use crate::dialect::{MigrationOptions, TablePlan};
use crate::remote::{RemoteColumn, RemoteSchema, RemoteTable};
use crate::tests::{
    assert_no_statement, executable, find_statement, schema_of, users_descriptor,
    users_remote_postgres,
};

fn plan(
    descriptor: &ModelDescriptor,
    remote: &RemoteSchema,
    options: &MigrationOptions,
) -> TablePlan {
    let mut emitted: HashSet<String> = HashSet::new();
    plan_table(
        descriptor,
        std::slice::from_ref(descriptor),
        remote,
        options,
        &mut emitted,
    )
}

fn posts_descriptor() -> ModelDescriptor {
    ModelDescriptor::from_model(
        &ModelDescriptor::new("posts")
            .column(Column::new("id", "bigint").primary_key().auto_increment())
            .column(Column::new("status", "enum").values(&["draft", "published"])),
    )
    .unwrap()
}

#[test]
fn test_create_table_with_enum_column() {
    let result: TablePlan = plan(
        &posts_descriptor(),
        &RemoteSchema::new(),
        &MigrationOptions::default(),
    );

    find_statement(
        &result.queries,
        "DO $$ BEGIN CREATE TYPE \"posts_status_enum\" AS ENUM ('draft','published'); EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
    );
    let create: &String = find_statement(&result.queries, "CREATE TABLE IF NOT EXISTS \"posts\"");
    assert!(create.contains("\"id\" bigserial"));
    assert!(create.contains("\"status\" \"posts_status_enum\""));
    assert!(create.contains("PRIMARY KEY (\"id\")"));
    find_statement(&result.queries, "COMMENT ON TABLE \"posts\" IS '0.0.0';");

    // The enum guard must come before the table that uses the type.
    let guard_position: usize = result
        .queries
        .iter()
        .position(|s| s.contains("CREATE TYPE"))
        .unwrap();
    let create_position: usize = result
        .queries
        .iter()
        .position(|s| s.contains("CREATE TABLE"))
        .unwrap();
    assert!(guard_position < create_position);
}

#[test]
fn test_matching_remote_produces_only_comment_lines() {
    let descriptor: ModelDescriptor = users_descriptor();
    let remote: RemoteSchema = schema_of(vec![users_remote_postgres()]);
    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());

    assert!(
        executable(&result.queries).is_empty(),
        "expected a pure diff, got {:#?}",
        result.queries
    );
}

#[test]
fn test_enum_values_append_with_guards_on_existing_table() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("posts")
            .column(Column::new("id", "bigint").primary_key().auto_increment())
            .column(
                Column::new("status", "enum").values(&["draft", "published", "archived"]),
            ),
    )
    .unwrap();

    let remote_posts: RemoteTable = RemoteTable {
        name: String::from("posts"),
        columns: vec![
            RemoteColumn {
                name: String::from("id"),
                column_type: String::from("bigint"),
                nullable: false,
                default: Some(String::from("nextval('posts_id_seq'::regclass)")),
                column_key: String::from("PRI"),
                extra: String::from("auto_increment"),
                ..RemoteColumn::default()
            },
            RemoteColumn {
                name: String::from("status"),
                column_type: String::from("posts_status_enum"),
                nullable: true,
                ..RemoteColumn::default()
            },
        ],
        primary_key: vec![String::from("id")],
        ..RemoteTable::default()
    };
    let remote: RemoteSchema = schema_of(vec![remote_posts]);

    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());
    find_statement(
        &result.queries,
        "ALTER TYPE \"posts_status_enum\" ADD VALUE IF NOT EXISTS 'archived';",
    );
    // Existing data stays put: no column drop, no type drop.
    assert_no_statement(&result.queries, "DROP");
}

#[test]
fn test_not_null_addition_gets_type_appropriate_zero_default() {
    let remote: RemoteSchema = schema_of(vec![users_remote_postgres()]);

    let with_flags: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("users")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(Column::new("email", "varchar").size(255).unique().not_null())
            .column(
                Column::new("created_at", "timestamp")
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP"),
            )
            .column(Column::new("visits", "int").not_null())
            .column(Column::new("bio", "text").not_null())
            .column(Column::new("active", "bool").not_null()),
    )
    .unwrap();

    let result: TablePlan = plan(&with_flags, &remote, &MigrationOptions::default());

    find_statement(
        &result.queries,
        "ALTER TABLE \"users\" ADD COLUMN \"visits\" int DEFAULT 0 NOT NULL;",
    );
    find_statement(
        &result.queries,
        "ALTER TABLE \"users\" ADD COLUMN \"bio\" text DEFAULT '' NOT NULL;",
    );
    find_statement(
        &result.queries,
        "ALTER TABLE \"users\" ADD COLUMN \"active\" bool DEFAULT false NOT NULL;",
    );
}

#[test]
fn test_type_change_between_castable_families_uses_using() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("users")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(Column::new("email", "varchar").size(255).unique().not_null())
            .column(
                Column::new("created_at", "timestamp")
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP"),
            ),
    )
    .unwrap();
    let mut table: RemoteTable = users_remote_postgres();
    table.columns[1].column_type = String::from("text");
    let remote: RemoteSchema = schema_of(vec![table]);

    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());
    find_statement(
        &result.queries,
        "ALTER TABLE \"users\" ALTER COLUMN \"email\" TYPE varchar(255) USING \"email\"::varchar(255);",
    );
}

#[test]
fn test_auto_increment_retrofit_creates_owned_sequence() {
    let descriptor: ModelDescriptor = users_descriptor();
    let mut table: RemoteTable = users_remote_postgres();
    table.columns[0].default = None;
    table.columns[0].extra = String::new();
    let remote: RemoteSchema = schema_of(vec![table]);

    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());
    find_statement(
        &result.queries,
        "CREATE SEQUENCE IF NOT EXISTS \"users_id_seq\";",
    );
    find_statement(
        &result.queries,
        "ALTER TABLE \"users\" ALTER COLUMN \"id\" SET DEFAULT nextval('users_id_seq');",
    );
    find_statement(
        &result.queries,
        "ALTER SEQUENCE \"users_id_seq\" OWNED BY \"users\".\"id\";",
    );
}

#[test]
fn test_nullability_reconciliation() {
    let descriptor: ModelDescriptor = users_descriptor();
    let mut table: RemoteTable = users_remote_postgres();
    table.columns[1].nullable = true;
    let remote: RemoteSchema = schema_of(vec![table]);

    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());
    find_statement(
        &result.queries,
        "ALTER TABLE \"users\" ALTER COLUMN \"email\" SET NOT NULL;",
    );
}

#[test]
fn test_comment_drift_emits_comment_on_column() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("users")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(
                Column::new("email", "varchar")
                    .size(255)
                    .unique()
                    .not_null()
                    .comment("login identity"),
            )
            .column(
                Column::new("created_at", "timestamp")
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP"),
            ),
    )
    .unwrap();
    let remote: RemoteSchema = schema_of(vec![users_remote_postgres()]);

    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());
    find_statement(
        &result.queries,
        "COMMENT ON COLUMN \"users\".\"email\" IS 'login identity';",
    );
}

#[test]
fn test_fulltext_index_renders_gin_over_tsvectors() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("articles")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(Column::new("title", "varchar").size(255))
            .column(Column::new("body", "text"))
            .index(Index::new("idx_articles_search").fulltext().columns(&["title", "body"])),
    )
    .unwrap();
    let result: TablePlan = plan(
        &descriptor,
        &RemoteSchema::new(),
        &MigrationOptions::default(),
    );

    find_statement(
        &result.queries,
        "CREATE INDEX \"idx_articles_search\" ON \"articles\" USING GIN ((to_tsvector('english', \"title\") || ' ' || to_tsvector('english', \"body\")));",
    );
}

#[test]
fn test_fulltext_index_matches_remote_by_name_only() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("articles")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(Column::new("body", "text"))
            .index(Index::new("idx_articles_search").fulltext().columns(&["body"])),
    )
    .unwrap();

    let remote_articles: RemoteTable = RemoteTable {
        name: String::from("articles"),
        columns: vec![
            RemoteColumn {
                name: String::from("id"),
                column_type: String::from("int"),
                nullable: false,
                default: Some(String::from("nextval('articles_id_seq'::regclass)")),
                column_key: String::from("PRI"),
                extra: String::from("auto_increment"),
                ..RemoteColumn::default()
            },
            RemoteColumn {
                name: String::from("body"),
                column_type: String::from("text"),
                nullable: true,
                ..RemoteColumn::default()
            },
        ],
        primary_key: vec![String::from("id")],
        indexes: vec![crate::remote::RemoteIndex {
            // Expression index: the catalog attributes no plain columns.
            name: String::from("idx_articles_search"),
            unique: false,
            columns: Vec::new(),
        }],
        ..RemoteTable::default()
    };
    let remote: RemoteSchema = schema_of(vec![remote_articles]);

    let result: TablePlan = plan(&descriptor, &remote, &MigrationOptions::default());
    assert!(executable(&result.queries).is_empty());
}

#[test]
fn test_on_update_trigger_pair_is_emitted_once() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("documents")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(
                Column::new("updated_at", "timestamp")
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP")
                    .on_update_value("CURRENT_TIMESTAMP"),
            ),
    )
    .unwrap();

    let mut emitted: HashSet<String> = HashSet::new();
    let first: TablePlan = plan_table(
        &descriptor,
        std::slice::from_ref(&descriptor),
        &RemoteSchema::new(),
        &MigrationOptions::default(),
        &mut emitted,
    );
    let second: TablePlan = plan_table(
        &descriptor,
        std::slice::from_ref(&descriptor),
        &RemoteSchema::new(),
        &MigrationOptions::default(),
        &mut emitted,
    );

    find_statement(
        &first.queries,
        "CREATE OR REPLACE FUNCTION update_documents_updated_at_column()",
    );
    find_statement(&first.queries, "CREATE TRIGGER \"set_updated_at_documents\"");
    assert_no_statement(&second.queries, "CREATE OR REPLACE FUNCTION");
}

#[test]
fn test_normalize_type_spellings() {
    assert_eq!(normalize_type("boolean"), "bool");
    assert_eq!(normalize_type("integer"), "int");
    assert_eq!(normalize_type("int8"), "bigint");
    assert_eq!(normalize_type("character varying"), "varchar");
    assert_eq!(normalize_type("numeric(10,2)"), "decimal(10,2)");
}

#[test]
fn test_enum_type_name_shape() {
    assert_eq!(enum_type_name("posts", "status"), "posts_status_enum");
}
