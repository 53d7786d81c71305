// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Process-wide engine configuration.
//!
//! A small string-keyed map that carries dialect defaults (engine, charset,
//! collation) and facts recorded by the connection layer (the MySQL engine
//! flavor). It is guarded by a reader/writer lock because model
//! `column_definition` callbacks may read defaults while other models are
//! still being registered.

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

/// Key for the default table engine (MySQL), `INNODB` unless overridden.
pub const DEFAULT_ENGINE: &str = "default_engine";

/// Key for the default character set, `utf8mb4` unless overridden.
pub const DEFAULT_CHARSET: &str = "default_charset";

/// Key for the default collation, `utf8mb4_unicode_ci` unless overridden.
pub const DEFAULT_COLLATION: &str = "default_collation";

/// Key for the MySQL engine flavor, `mysql` or `mariadb`.
///
/// Written automatically when a MySQL connection is established.
pub const MYSQL_ENGINE: &str = "mysql_engine";

static CONFIG: LazyLock<RwLock<HashMap<String, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Sets a configuration value.
pub fn set(key: &str, value: &str) {
    let mut map = CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    map.insert(key.to_string(), value.to_string());
}

/// Reads a configuration value.
#[must_use]
pub fn get(key: &str) -> Option<String> {
    let map = CONFIG.read().unwrap_or_else(PoisonError::into_inner);
    map.get(key).cloned()
}

/// The default table engine for MySQL CREATE statements.
#[must_use]
pub fn default_engine() -> String {
    get(DEFAULT_ENGINE).unwrap_or_else(|| String::from("INNODB"))
}

/// The default character set for MySQL CREATE statements.
#[must_use]
pub fn default_charset() -> String {
    get(DEFAULT_CHARSET).unwrap_or_else(|| String::from("utf8mb4"))
}

/// The default collation for MySQL CREATE statements.
#[must_use]
pub fn default_collation() -> String {
    get(DEFAULT_COLLATION).unwrap_or_else(|| String::from("utf8mb4_unicode_ci"))
}

/// The MySQL engine flavor recorded at connect time, `mysql` by default.
#[must_use]
pub fn mysql_engine() -> String {
    get(MYSQL_ENGINE).unwrap_or_else(|| String::from("mysql"))
}
