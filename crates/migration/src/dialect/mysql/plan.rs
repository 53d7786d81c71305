// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! MySQL/MariaDB DDL planning.
//!
//! Pure functions from a model descriptor plus the remote snapshot to an
//! ordered statement list. Nothing here touches a connection; the dialect's
//! `generate_migration` drives these per registered descriptor.

use altar_schema::{Column, Index, ModelDescriptor, TypeFamily, config, constrain_index_name};

use crate::defaults::mysql_defaults_equal;
use crate::dialect::{MigrationOptions, TablePlan};
use crate::fk::{ResolvedForeignKey, resolve_foreign_keys};
use crate::remote::{RemoteSchema, RemoteTable};

/// MySQL identifier length limit applied to index names.
const INDEX_NAME_LIMIT: usize = 64;

pub(crate) fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Plans one table: CREATE when it is absent remotely, ALTER otherwise.
pub(crate) fn plan_table(
    descriptor: &ModelDescriptor,
    descriptors: &[ModelDescriptor],
    remote: &RemoteSchema,
    options: &MigrationOptions,
    mariadb: bool,
) -> TablePlan {
    let mut plan: TablePlan = TablePlan::default();
    plan.queries.push(format!("-- {}", descriptor.table()));

    if let Some(table) = remote.get(descriptor.table()) {
        alter_table(descriptor, table, options, mariadb, &mut plan.queries);
    } else {
        create_table(descriptor, mariadb, &mut plan.queries);
    }

    for fk in resolve_foreign_keys(descriptor, descriptors, remote) {
        plan.tail.push(render_foreign_key(&fk));
    }

    plan
}

/// Normalizes a type spelling for comparison.
///
/// Lower-cases, folds `integer` to `int`, strips integer display widths
/// (`int(11)` → `int`), and applies the MariaDB substitutions when the
/// connection reported a MariaDB server.
pub(crate) fn normalize_type(type_name: &str, mariadb: bool) -> String {
    let mut lowered: String = type_name.trim().to_lowercase();

    if mariadb && lowered == "json" {
        lowered = String::from("longtext");
    }

    let base: String = lowered.split('(').next().unwrap_or("").trim().to_string();
    let base: String = match base.as_str() {
        "integer" => String::from("int"),
        // MySQL stores BOOL columns as tinyint(1).
        "bool" | "boolean" => String::from("tinyint"),
        _ => base,
    };

    if TypeFamily::of(&base) == TypeFamily::Integer {
        return base;
    }

    lowered
}

/// Renders the surface type for a column.
fn render_type(column: &Column, mariadb: bool) -> String {
    if column.family() == TypeFamily::Enum {
        let values: Vec<String> = column
            .enum_values()
            .iter()
            .map(|v| format!("'{}'", v.replace('\'', "''")))
            .collect();
        return format!("ENUM({})", values.join(","));
    }

    let mut type_name: String = column.type_name().to_string();
    if mariadb && type_name.eq_ignore_ascii_case("json") {
        type_name = String::from("longtext");
    }

    if column.get_size() > 0 {
        format!("{type_name}({})", column.get_size())
    } else if column.get_precision() > 0 {
        format!(
            "{type_name}({},{})",
            column.get_precision(),
            column.get_scale()
        )
    } else {
        type_name
    }
}

/// Whether a default value renders unquoted (expressions and numbers).
fn is_expression_default(value: &str) -> bool {
    let upper: String = value.trim().to_uppercase();
    upper == "NULL"
        || upper == "NOW()"
        || upper == "CURRENT_TIMESTAMP"
        || upper.starts_with("CURRENT_TIMESTAMP(")
        || upper == "CURRENT_DATE"
        || upper == "CURRENT_DATE()"
        || value.trim().parse::<f64>().is_ok()
}

/// Renders the full column definition used in CREATE, ADD and MODIFY.
fn render_column(column: &Column, include_auto_increment: bool, mariadb: bool) -> String {
    let mut parts: Vec<String> = vec![
        quote(column.name()),
        render_type(column, mariadb),
    ];

    if let Some(charset) = column.get_charset() {
        parts.push(format!("CHARACTER SET {charset}"));
    }
    if let Some(collation) = column.get_collation() {
        parts.push(format!("COLLATE {collation}"));
    }

    if !column.is_nullable() {
        parts.push(String::from("NOT NULL"));
    }

    if column.has_default() {
        if is_expression_default(column.default()) {
            parts.push(format!("DEFAULT {}", column.default().trim()));
        } else {
            parts.push(format!("DEFAULT '{}'", column.default().replace('\'', "''")));
        }
    }

    if let Some(expression) = column.on_update_expression() {
        parts.push(format!("ON UPDATE {expression}"));
    }

    if include_auto_increment && column.is_auto_increment() {
        parts.push(String::from("AUTO_INCREMENT"));
    }

    if !column.get_comment().is_empty() {
        parts.push(format!(
            "COMMENT '{}'",
            column.get_comment().replace('\'', "''")
        ));
    }

    parts.join(" ")
}

fn create_table(descriptor: &ModelDescriptor, mariadb: bool, queries: &mut Vec<String>) {
    let mut body: Vec<String> = descriptor
        .get_columns()
        .iter()
        .map(|c| format!("    {}", render_column(c, true, mariadb)))
        .collect();

    let primary: Vec<String> = descriptor
        .primary_key_columns()
        .iter()
        .map(|c| quote(c.name()))
        .collect();
    if !primary.is_empty() {
        body.push(format!("    PRIMARY KEY ({})", primary.join(",")));
    }

    for column in descriptor.get_columns() {
        if column.is_fulltext() {
            body.push(format!("    FULLTEXT({})", quote(column.name())));
        }
    }

    let charset: String = descriptor
        .get_charset()
        .map_or_else(config::default_charset, str::to_string);
    let collation: String = descriptor
        .get_collation()
        .map_or_else(config::default_collation, str::to_string);
    let engine: String = descriptor
        .get_engine()
        .map_or_else(config::default_engine, str::to_string);

    queries.push(format!(
        "CREATE TABLE {} (\n{}\n) DEFAULT CHARSET={charset} COLLATE={collation} ENGINE={engine} COMMENT '0.0.0';",
        quote(descriptor.table()),
        body.join(",\n"),
    ));

    for index in descriptor.get_indexes() {
        queries.push(render_create_index(descriptor.table(), index));
    }
}

fn render_create_index(table: &str, index: &Index) -> String {
    let name: String = constrain_index_name(index.name(), INDEX_NAME_LIMIT);
    let columns: Vec<String> = index.column_names().iter().map(|c| quote(c)).collect();
    let kind: &str = if index.is_unique() {
        "UNIQUE "
    } else if index.is_fulltext() {
        "FULLTEXT "
    } else {
        ""
    };

    format!(
        "CREATE {kind}INDEX {} ON {} ({});",
        quote(&name),
        quote(table),
        columns.join(",")
    )
}

#[allow(clippy::too_many_lines)]
fn alter_table(
    descriptor: &ModelDescriptor,
    remote: &RemoteTable,
    options: &MigrationOptions,
    mariadb: bool,
    queries: &mut Vec<String>,
) {
    let table: String = quote(descriptor.table());
    let mut deferred_auto_increment: Vec<String> = Vec::new();
    let mut previous: Option<&str> = None;

    for column in descriptor.get_columns() {
        match remote.find_column(column.name()) {
            None => {
                let position: String = previous.map_or_else(
                    || String::from(" FIRST"),
                    |name| format!(" AFTER {}", quote(name)),
                );
                queries.push(format!(
                    "ALTER TABLE {table} ADD {}{position};",
                    render_column(column, false, mariadb)
                ));
                if column.is_auto_increment() {
                    deferred_auto_increment.push(format!(
                        "ALTER TABLE {table} MODIFY COLUMN {};",
                        render_column(column, true, mariadb)
                    ));
                }
            }
            Some(remote_column) => {
                if column.is_auto_increment() {
                    if !remote_column.is_auto_increment() {
                        deferred_auto_increment.push(format!(
                            "ALTER TABLE {table} MODIFY COLUMN {};",
                            render_column(column, true, mariadb)
                        ));
                    }
                    previous = Some(column.name());
                    continue;
                }

                let type_changed: bool = column.family() != TypeFamily::Enum
                    && normalize_type(&render_type(column, mariadb), mariadb)
                        != normalize_type(&remote_column.column_type, mariadb);
                let default_changed: bool =
                    !mysql_defaults_equal(column.default(), remote_column.default.as_deref());
                let nullable_changed: bool = column.is_nullable() != remote_column.nullable;
                let comment_changed: bool = column.get_comment() != remote_column.comment;

                if type_changed || default_changed || nullable_changed || comment_changed {
                    queries.push(format!(
                        "ALTER TABLE {table} MODIFY COLUMN {};",
                        render_column(column, false, mariadb)
                    ));
                }
            }
        }
        previous = Some(column.name());
    }

    if options.strict {
        for remote_column in &remote.columns {
            if descriptor.find_column(&remote_column.name).is_none() {
                queries.push(format!(
                    "ALTER TABLE {table} DROP COLUMN {};",
                    quote(&remote_column.name)
                ));
            }
        }
    }

    reconcile_primary_key(descriptor, remote, &table, queries);
    queries.append(&mut deferred_auto_increment);
    reconcile_indexes(descriptor, remote, options, queries);
}

fn reconcile_primary_key(
    descriptor: &ModelDescriptor,
    remote: &RemoteTable,
    table: &str,
    queries: &mut Vec<String>,
) {
    let mut wanted: Vec<String> = descriptor
        .primary_key_columns()
        .iter()
        .map(|c| c.name().to_lowercase())
        .collect();
    let mut actual: Vec<String> = remote
        .primary_key
        .iter()
        .map(|c| c.to_lowercase())
        .collect();
    wanted.sort();
    actual.sort();

    if wanted == actual {
        return;
    }

    if !remote.primary_key.is_empty() {
        queries.push(format!("ALTER TABLE {table} DROP PRIMARY KEY;"));
    }

    if !wanted.is_empty() {
        let columns: Vec<String> = descriptor
            .primary_key_columns()
            .iter()
            .map(|c| quote(c.name()))
            .collect();
        queries.push(format!(
            "ALTER TABLE {table} ADD PRIMARY KEY({});",
            columns.join(",")
        ));
    }
}

fn reconcile_indexes(
    descriptor: &ModelDescriptor,
    remote: &RemoteTable,
    options: &MigrationOptions,
    queries: &mut Vec<String>,
) {
    let table: String = quote(descriptor.table());
    let mut wanted_names: Vec<String> = Vec::new();

    for index in descriptor.get_indexes() {
        let name: String = constrain_index_name(index.name(), INDEX_NAME_LIMIT);
        wanted_names.push(name.to_lowercase());

        match remote.find_index(&name, true) {
            None => queries.push(render_create_index(descriptor.table(), index)),
            Some(remote_index) => {
                let columns_match: bool = remote_index.columns.len()
                    == index.column_names().len()
                    && remote_index
                        .columns
                        .iter()
                        .zip(index.column_names())
                        .all(|(a, b)| a.eq_ignore_ascii_case(b));

                if remote_index.unique != index.is_unique() || !columns_match {
                    queries.push(format!(
                        "DROP INDEX {} ON {table};",
                        quote(&remote_index.name)
                    ));
                    queries.push(render_create_index(descriptor.table(), index));
                }
            }
        }
    }

    if options.strict {
        for remote_index in &remote.indexes {
            if remote_index.name.to_lowercase().starts_with("fk_") {
                continue;
            }
            if wanted_names.contains(&remote_index.name.to_lowercase()) {
                continue;
            }
            queries.push(format!(
                "DROP INDEX {} ON {table};",
                quote(&remote_index.name)
            ));
        }
    }
}

fn render_foreign_key(fk: &ResolvedForeignKey) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {};",
        quote(&fk.table),
        quote(&fk.name),
        quote(&fk.column),
        quote(&fk.referenced_table),
        quote(&fk.referenced_column),
        fk.on_delete,
        fk.on_update,
    )
}
