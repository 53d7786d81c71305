// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

//! Dialect-aware relational schema migration engine.
//!
//! The engine compares registered [`altar_schema::ModelDescriptor`]s
//! against the live database catalog and reconciles the difference with
//! ordinary DDL: CREATE for absent tables, targeted ALTERs for drifted
//! ones, a deferred foreign-key tail once every table exists, and
//! version-gated user statements tracked through each table's comment
//! slot. One advisory lock serializes runs across processes, and every run
//! leaves one row in the `schema_migration` history table.
//!
//! ## Dialects
//!
//! MySQL/MariaDB and PostgreSQL are built in and self-registered; further
//! dialects plug in through [`register_dialect`]. An unknown driver is a
//! hard error, never a silent fallback.
//!
//! ## Usage
//!
//! ```no_run
//! use altar_migration::{Migrator, SchemaConnection};
//! use altar_schema::{Column, ModelDescriptor};
//!
//! fn migrate() -> Result<(), altar_migration::MigrationError> {
//!     let users = ModelDescriptor::new("users")
//!         .column(Column::new("id", "int").primary_key().auto_increment())
//!         .column(Column::new("email", "varchar").size(255).unique().not_null());
//!
//!     let mut conn = SchemaConnection::establish("mysql://app@localhost/app")?;
//!     let mut migrator = Migrator::new();
//!     migrator.register(&users)?;
//!     let report = migrator.run(&mut conn)?;
//!     assert!(report.succeeded());
//!     Ok(())
//! }
//! ```

mod connection;
mod defaults;
mod dialect;
mod error;
mod fk;
mod history;
mod remote;
mod runner;
mod statement;

#[cfg(test)]
mod tests;

pub use connection::{DRIVER_MYSQL, DRIVER_POSTGRES, SchemaConnection};
pub use dialect::mysql::MysqlDialect;
pub use dialect::postgres::PostgresDialect;
pub use dialect::{
    MIGRATION_LOCK, MigrationOptions, MigrationPlan, SchemaDialect, init_dialect,
    register_dialect,
};
pub use error::MigrationError;
pub use history::{HISTORY_TABLE, HistoryRow, MigrationStatus, NewHistoryRow};
pub use remote::{
    JoinConstraint, RemoteColumn, RemoteForeignKey, RemoteIndex, RemoteSchema, RemoteTable,
};
pub use runner::{MigrationReport, Migrator};
