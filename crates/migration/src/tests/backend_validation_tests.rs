// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live-backend validation tests.
//!
//! Everything here is `#[ignore]`d and runs only through the xtask
//! commands, which provision a throwaway container, export the environment
//! variables, and always clean up:
//!
//! - `cargo xtask test-mysql` — MySQL/MariaDB (`ALTAR_TEST_BACKEND=mysql`)
//! - `cargo xtask test-postgres` — PostgreSQL (`ALTAR_TEST_BACKEND=postgres`)
//!
//! The standard `cargo test` run stays fast and infrastructure-free; these
//! tests fail fast when the environment is missing rather than silently
//! skipping.
//!
//! ## What These Tests Validate
//!
//! The end-to-end flavor of the planning suites: CREATE on first run,
//! idempotence on the second (§8 S3), version-gated migrations advancing
//! the table comment (§8 S6), advisory lock cycling, and history rows.

use std::env;

use altar_schema::{Column, ModelDescriptor};

use crate::connection::SchemaConnection;
use crate::dialect::{SchemaDialect, init_dialect};
use crate::history::HistoryRow;
use crate::runner::{MigrationReport, Migrator};

/// Reads the backend connection URL from the environment.
///
/// # Panics
///
/// Panics when `DATABASE_URL` is not set, indicating the test was run
/// outside xtask.
fn database_url() -> String {
    env::var("DATABASE_URL")
        .expect("DATABASE_URL not set - backend tests must be run via `cargo xtask test-mysql` or `cargo xtask test-postgres`")
}

/// Verifies the expected backend is provisioned.
///
/// # Panics
///
/// Panics when `ALTAR_TEST_BACKEND` is unset or names another backend.
fn verify_backend(expected: &str) {
    let backend: String = env::var("ALTAR_TEST_BACKEND").expect(
        "ALTAR_TEST_BACKEND not set - backend tests must be run via the xtask commands",
    );
    assert_eq!(backend, expected, "wrong backend provisioned for this test");
}

fn connect() -> SchemaConnection {
    SchemaConnection::establish(&database_url()).expect("Failed to connect to test backend")
}

fn users_model(table: &str) -> ModelDescriptor {
    ModelDescriptor::new(table)
        .column(Column::new("id", "int").primary_key().auto_increment())
        .column(Column::new("email", "varchar").size(255).unique().not_null())
        .column(
            Column::new("created_at", "timestamp")
                .not_null()
                .default_value("CURRENT_TIMESTAMP"),
        )
}

/// First run creates, second run is a no-op with a success history row.
fn assert_create_then_idempotent(table: &str) {
    let mut conn: SchemaConnection = connect();
    let mut migrator: Migrator = Migrator::new();
    migrator.register(&users_model(table)).unwrap();

    let first: MigrationReport = migrator.run(&mut conn).expect("first run");
    assert!(first.succeeded(), "first run failed: {:?}", first.error_message);
    assert!(first.executed_queries > 0);
    assert_eq!(first.created_tables, [table.to_string()]);

    let second: MigrationReport = migrator.run(&mut conn).expect("second run");
    assert!(second.succeeded(), "second run failed: {:?}", second.error_message);
    assert_eq!(second.executed_queries, 0);
    assert_eq!(second.altered_tables, [table.to_string()]);

    let dialect: Box<dyn SchemaDialect> = init_dialect(&conn).unwrap();
    let history: Vec<HistoryRow> = dialect.list_history(&mut conn).unwrap();
    assert!(history.len() >= 2);
    let last: &HistoryRow = history.last().unwrap();
    assert_eq!(last.status, "success");
    assert_eq!(last.executed_queries, 0);
    assert_eq!(last.hash.len(), 32);
}

/// Version migration applies once and pins the table comment (§8 S6).
fn assert_version_migration(table: &str) {
    let mut conn: SchemaConnection = connect();
    let model: ModelDescriptor = ModelDescriptor::new(table)
        .column(Column::new("id", "int").primary_key().auto_increment())
        .column(Column::new("message", "text"))
        .migration(
            "1.0.0",
            &format!("ALTER TABLE {table} ADD COLUMN session_id varchar(255)"),
        );

    let mut migrator: Migrator = Migrator::new();
    migrator.register(&model).unwrap();

    let first: MigrationReport = migrator.run(&mut conn).expect("first run");
    assert!(first.succeeded(), "first run failed: {:?}", first.error_message);

    let dialect: Box<dyn SchemaDialect> = init_dialect(&conn).unwrap();
    let database: String = dialect.current_database(&mut conn).unwrap();
    let version: String = dialect
        .get_table_version(&mut conn, &database, table)
        .unwrap();
    assert_eq!(version, "1.0.0");

    let second: MigrationReport = migrator.run(&mut conn).expect("second run");
    assert!(second.succeeded());
    assert_eq!(second.executed_queries, 0);
}

/// The advisory lock can be acquired and released repeatedly.
fn assert_lock_cycle() {
    let mut conn: SchemaConnection = connect();
    let dialect: Box<dyn SchemaDialect> = init_dialect(&conn).unwrap();

    dialect.acquire_migration_lock(&mut conn).expect("acquire");
    dialect.release_migration_lock(&mut conn);
    dialect.acquire_migration_lock(&mut conn).expect("re-acquire");
    dialect.release_migration_lock(&mut conn);
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_connection() {
    verify_backend("mysql");
    let conn: SchemaConnection = connect();
    assert_eq!(conn.driver_name(), "mysql");
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_create_then_idempotent() {
    verify_backend("mysql");
    assert_create_then_idempotent("bv_users");
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_version_migration() {
    verify_backend("mysql");
    assert_version_migration("bv_logs");
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_lock_cycle() {
    verify_backend("mysql");
    assert_lock_cycle();
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_foreign_key_round_trip() {
    verify_backend("mysql");
    let mut conn: SchemaConnection = connect();

    let mut migrator: Migrator = Migrator::new();
    migrator.register(&users_model("bv_owners")).unwrap();
    migrator
        .register(
            &ModelDescriptor::new("bv_pets")
                .column(Column::new("id", "int").primary_key().auto_increment())
                .column(Column::new("owner_id", "int").not_null().references("bv_owners")),
        )
        .unwrap();

    let report: MigrationReport = migrator.run(&mut conn).expect("run");
    assert!(report.succeeded(), "run failed: {:?}", report.error_message);

    let dialect: Box<dyn SchemaDialect> = init_dialect(&conn).unwrap();
    let database: String = dialect.current_database(&mut conn).unwrap();
    let constraints = dialect.get_join_constraints(&mut conn, &database).unwrap();
    assert!(constraints.iter().any(|c| {
        c.table == "bv_pets"
            && c.column == "owner_id"
            && c.referenced_table == "bv_owners"
            && c.referenced_column == "id"
    }));
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_connection() {
    verify_backend("postgres");
    let conn: SchemaConnection = connect();
    assert_eq!(conn.driver_name(), "postgres");
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_create_then_idempotent() {
    verify_backend("postgres");
    assert_create_then_idempotent("bv_users");
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_version_migration() {
    verify_backend("postgres");
    assert_version_migration("bv_logs");
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_lock_cycle() {
    verify_backend("postgres");
    assert_lock_cycle();
}

#[test]
#[ignore = "requires PostgreSQL via cargo xtask test-postgres"]
fn test_postgres_enum_table_round_trip() {
    verify_backend("postgres");
    let mut conn: SchemaConnection = connect();

    let model: ModelDescriptor = ModelDescriptor::new("bv_posts")
        .column(Column::new("id", "bigint").primary_key().auto_increment())
        .column(Column::new("status", "enum").values(&["draft", "published"]));

    let mut migrator: Migrator = Migrator::new();
    migrator.register(&model).unwrap();

    let first: MigrationReport = migrator.run(&mut conn).expect("first run");
    assert!(first.succeeded(), "first run failed: {:?}", first.error_message);

    // Adding a variant must extend the type without touching data.
    let extended: ModelDescriptor = ModelDescriptor::new("bv_posts")
        .column(Column::new("id", "bigint").primary_key().auto_increment())
        .column(Column::new("status", "enum").values(&["draft", "published", "archived"]));

    let mut migrator: Migrator = Migrator::new();
    migrator.register(&extended).unwrap();
    let second: MigrationReport = migrator.run(&mut conn).expect("second run");
    assert!(second.succeeded(), "second run failed: {:?}", second.error_message);
}
