// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! PostgreSQL DDL planning.
//!
//! Pure functions from a model descriptor plus the remote snapshot to an
//! ordered statement list. PostgreSQL needs more ceremony than MySQL: enum
//! columns become named user types behind `duplicate_object` guards, table
//! and column comments are separate statements, `ON UPDATE` column
//! semantics become trigger-function pairs, and auto-increment retrofits
//! become sequences owned by their column.

use std::collections::HashSet;

use altar_schema::{Column, Index, ModelDescriptor, TypeFamily, constrain_index_name};

use crate::defaults::postgres_defaults_equal;
use crate::dialect::{MigrationOptions, TablePlan};
use crate::fk::{ResolvedForeignKey, resolve_foreign_keys};
use crate::remote::{RemoteColumn, RemoteSchema, RemoteTable};

/// PostgreSQL identifier length limit applied to index names.
const INDEX_NAME_LIMIT: usize = 63;

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Plans one table: CREATE when it is absent remotely, ALTER otherwise.
pub(crate) fn plan_table(
    descriptor: &ModelDescriptor,
    descriptors: &[ModelDescriptor],
    remote: &RemoteSchema,
    options: &MigrationOptions,
    emitted_triggers: &mut HashSet<String>,
) -> TablePlan {
    let mut plan: TablePlan = TablePlan::default();
    plan.queries.push(format!("-- {}", descriptor.table()));

    if let Some(table) = remote.get(descriptor.table()) {
        alter_table(descriptor, table, options, emitted_triggers, &mut plan.queries);
    } else {
        create_table(descriptor, emitted_triggers, &mut plan.queries);
    }

    for fk in resolve_foreign_keys(descriptor, descriptors, remote) {
        plan.tail.push(render_foreign_key(&fk));
    }

    plan
}

/// The user-type name backing an enum column.
pub(crate) fn enum_type_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_enum")
}

/// Normalizes a type spelling for comparison.
pub(crate) fn normalize_type(type_name: &str) -> String {
    let lowered: String = type_name.trim().to_lowercase();
    let (base, suffix): (&str, &str) = lowered
        .find('(')
        .map_or((lowered.as_str(), ""), |pos| lowered.split_at(pos));

    let base: &str = match base.trim() {
        "boolean" => "bool",
        "integer" | "int4" => "int",
        "int8" => "bigint",
        "int2" => "smallint",
        "character varying" => "varchar",
        "numeric" => "decimal",
        other => other,
    };

    format!("{base}{suffix}")
}

/// Renders the surface type for a column.
///
/// In create mode, auto-increment integer columns render as their serial
/// counterpart; enum columns always render as their backing user type.
fn render_type(table: &str, column: &Column, create_mode: bool) -> String {
    if column.family() == TypeFamily::Enum {
        return quote(&enum_type_name(table, column.name()));
    }

    if create_mode && column.is_auto_increment() {
        let serial: &str = match normalize_type(column.type_name()).as_str() {
            "bigint" => "bigserial",
            "smallint" => "smallserial",
            _ => "serial",
        };
        return String::from(serial);
    }

    if column.get_size() > 0 {
        format!("{}({})", column.type_name(), column.get_size())
    } else if column.get_precision() > 0 {
        format!(
            "{}({},{})",
            column.type_name(),
            column.get_precision(),
            column.get_scale()
        )
    } else {
        column.type_name().to_string()
    }
}

/// Whether a default value renders unquoted.
fn is_expression_default(value: &str) -> bool {
    let upper: String = value.trim().to_uppercase();
    upper == "NULL"
        || upper == "TRUE"
        || upper == "FALSE"
        || upper == "NOW()"
        || upper == "CURRENT_TIMESTAMP"
        || upper.starts_with("CURRENT_TIMESTAMP(")
        || upper == "CURRENT_DATE"
        || upper == "CURRENT_DATE()"
        || value.trim().parse::<f64>().is_ok()
}

fn render_default(value: &str) -> String {
    if is_expression_default(value) {
        value.trim().to_string()
    } else {
        quote_literal(value)
    }
}

/// The type-appropriate zero default backfilled onto `NOT NULL` additions.
///
/// Enum and unknown families get none; the addition is then left to fail
/// on populated tables rather than invent a value.
const fn zero_default(family: TypeFamily) -> Option<&'static str> {
    match family {
        TypeFamily::Text => Some("''"),
        TypeFamily::Boolean => Some("false"),
        TypeFamily::Integer | TypeFamily::Decimal => Some("0"),
        TypeFamily::Timestamp => Some("CURRENT_TIMESTAMP"),
        TypeFamily::Date => Some("CURRENT_DATE"),
        TypeFamily::Json => Some("'{}'"),
        TypeFamily::Enum | TypeFamily::Unknown => None,
    }
}

fn render_enum_guards(table: &str, column: &Column, queries: &mut Vec<String>) {
    let type_name: String = enum_type_name(table, column.name());
    let values: Vec<String> = column
        .enum_values()
        .iter()
        .map(|v| quote_literal(v))
        .collect();

    queries.push(format!(
        "DO $$ BEGIN CREATE TYPE {} AS ENUM ({}); EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
        quote(&type_name),
        values.join(",")
    ));
}

fn render_enum_value_guards(table: &str, column: &Column, queries: &mut Vec<String>) {
    let type_name: String = enum_type_name(table, column.name());
    for value in column.enum_values() {
        queries.push(format!(
            "DO $$ BEGIN ALTER TYPE {} ADD VALUE IF NOT EXISTS {}; EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
            quote(&type_name),
            quote_literal(value)
        ));
    }
}

/// Emits the trigger-function pair for an `ON UPDATE` column.
///
/// The function name is cached on the dialect for the duration of the run
/// so repeated planning passes do not emit duplicates.
fn render_on_update_trigger(
    table: &str,
    column: &Column,
    expression: &str,
    emitted_triggers: &mut HashSet<String>,
    queries: &mut Vec<String>,
) {
    let function: String = format!("update_{table}_{}_column", column.name());
    if !emitted_triggers.insert(function.clone()) {
        return;
    }

    queries.push(format!(
        "CREATE OR REPLACE FUNCTION {function}() RETURNS TRIGGER AS $$ BEGIN NEW.{} = {expression}; RETURN NEW; END; $$ LANGUAGE plpgsql;",
        quote(column.name()),
    ));
    queries.push(format!(
        "DO $$ BEGIN CREATE TRIGGER {} BEFORE UPDATE ON {} FOR EACH ROW EXECUTE PROCEDURE {function}(); EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
        quote(&format!("set_{}_{table}", column.name())),
        quote(table),
    ));
}

fn render_column_create(table: &str, column: &Column) -> String {
    let mut parts: Vec<String> = vec![
        quote(column.name()),
        render_type(table, column, true),
    ];

    if column.has_default() && !column.is_auto_increment() {
        parts.push(format!("DEFAULT {}", render_default(column.default())));
    }

    if !column.is_nullable() {
        parts.push(String::from("NOT NULL"));
    }

    parts.join(" ")
}

fn create_table(
    descriptor: &ModelDescriptor,
    emitted_triggers: &mut HashSet<String>,
    queries: &mut Vec<String>,
) {
    let table: &str = descriptor.table();

    for column in descriptor.get_columns() {
        if column.family() == TypeFamily::Enum {
            render_enum_guards(table, column, queries);
        }
    }

    let mut body: Vec<String> = descriptor
        .get_columns()
        .iter()
        .map(|c| format!("    {}", render_column_create(table, c)))
        .collect();

    let primary: Vec<String> = descriptor
        .primary_key_columns()
        .iter()
        .map(|c| quote(c.name()))
        .collect();
    if !primary.is_empty() {
        body.push(format!("    PRIMARY KEY ({})", primary.join(",")));
    }

    queries.push(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        quote(table),
        body.join(",\n"),
    ));

    queries.push(format!(
        "COMMENT ON TABLE {} IS '0.0.0';",
        quote(table)
    ));

    for column in descriptor.get_columns() {
        if !column.get_comment().is_empty() {
            queries.push(render_column_comment(table, column.name(), column.get_comment()));
        }
        if let Some(expression) = column.on_update_expression() {
            render_on_update_trigger(table, column, expression, emitted_triggers, queries);
        }
    }

    for index in descriptor.get_indexes() {
        queries.push(render_create_index(table, index));
    }
}

fn render_column_comment(table: &str, column: &str, comment: &str) -> String {
    let value: String = if comment.is_empty() {
        String::from("NULL")
    } else {
        quote_literal(comment)
    };
    format!(
        "COMMENT ON COLUMN {}.{} IS {value};",
        quote(table),
        quote(column)
    )
}

fn render_create_index(table: &str, index: &Index) -> String {
    let name: String = constrain_index_name(index.name(), INDEX_NAME_LIMIT);

    if index.is_fulltext() {
        let vectors: Vec<String> = index
            .column_names()
            .iter()
            .map(|c| format!("to_tsvector('english', {})", quote(c)))
            .collect();
        return format!(
            "CREATE INDEX {} ON {} USING GIN (({}));",
            quote(&name),
            quote(table),
            vectors.join(" || ' ' || ")
        );
    }

    let columns: Vec<String> = index.column_names().iter().map(|c| quote(c)).collect();
    let unique: &str = if index.is_unique() { "UNIQUE " } else { "" };
    format!(
        "CREATE {unique}INDEX {} ON {} ({});",
        quote(&name),
        quote(table),
        columns.join(",")
    )
}

/// Whether a `USING <column>::<type>` clause is valid for the conversion.
fn needs_using_cast(remote_type: &str, target: &Column) -> bool {
    let castable = |family: TypeFamily| {
        matches!(
            family,
            TypeFamily::Text | TypeFamily::Integer | TypeFamily::Boolean
        )
    };
    castable(TypeFamily::of(remote_type)) && castable(target.family())
}

#[allow(clippy::too_many_lines)]
fn alter_table(
    descriptor: &ModelDescriptor,
    remote: &RemoteTable,
    options: &MigrationOptions,
    emitted_triggers: &mut HashSet<String>,
    queries: &mut Vec<String>,
) {
    let table: &str = descriptor.table();
    let quoted: String = quote(table);
    let mut deferred_auto_increment: Vec<String> = Vec::new();

    for column in descriptor.get_columns() {
        if column.family() == TypeFamily::Enum {
            render_enum_guards(table, column, queries);
            render_enum_value_guards(table, column, queries);
        }

        match remote.find_column(column.name()) {
            None => {
                let mut statement: String = format!(
                    "ALTER TABLE {quoted} ADD COLUMN {} {}",
                    quote(column.name()),
                    render_type(table, column, true)
                );
                // Serial types carry their own default and NOT NULL.
                if !column.is_auto_increment() {
                    if column.has_default() {
                        statement.push_str(&format!(" DEFAULT {}", render_default(column.default())));
                    } else if !column.is_nullable() {
                        if let Some(zero) = zero_default(column.family()) {
                            statement.push_str(&format!(" DEFAULT {zero}"));
                        }
                    }
                    if !column.is_nullable() {
                        statement.push_str(" NOT NULL");
                    }
                }
                statement.push(';');
                queries.push(statement);

                if !column.get_comment().is_empty() {
                    queries.push(render_column_comment(table, column.name(), column.get_comment()));
                }
            }
            Some(remote_column) => {
                alter_existing_column(
                    descriptor,
                    column,
                    remote_column,
                    &quoted,
                    &mut deferred_auto_increment,
                    queries,
                );
            }
        }

        if let Some(expression) = column.on_update_expression() {
            render_on_update_trigger(table, column, expression, emitted_triggers, queries);
        }
    }

    if options.strict {
        for remote_column in &remote.columns {
            if descriptor.find_column(&remote_column.name).is_none() {
                queries.push(format!(
                    "ALTER TABLE {quoted} DROP COLUMN {};",
                    quote(&remote_column.name)
                ));
            }
        }
    }

    reconcile_primary_key(descriptor, remote, &quoted, queries);
    queries.append(&mut deferred_auto_increment);
    reconcile_indexes(descriptor, remote, options, queries);
}

fn alter_existing_column(
    descriptor: &ModelDescriptor,
    column: &Column,
    remote_column: &RemoteColumn,
    quoted_table: &str,
    deferred_auto_increment: &mut Vec<String>,
    queries: &mut Vec<String>,
) {
    let table: &str = descriptor.table();

    if column.is_auto_increment() && !remote_column.is_auto_increment() {
        let sequence: String = format!("{table}_{}_seq", column.name());
        deferred_auto_increment.push(format!(
            "CREATE SEQUENCE IF NOT EXISTS {};",
            quote(&sequence)
        ));
        deferred_auto_increment.push(format!(
            "ALTER TABLE {quoted_table} ALTER COLUMN {} SET DEFAULT nextval('{sequence}');",
            quote(column.name())
        ));
        deferred_auto_increment.push(format!(
            "ALTER SEQUENCE {} OWNED BY {quoted_table}.{};",
            quote(&sequence),
            quote(column.name())
        ));
    }

    let type_changed: bool = !column.is_auto_increment()
        && column.family() != TypeFamily::Enum
        && normalize_type(&render_type(table, column, false))
            != normalize_type(&remote_column.column_type);

    if type_changed {
        let target: String = render_type(table, column, false);
        let using: String = if needs_using_cast(&remote_column.column_type, column) {
            format!(" USING {}::{target}", quote(column.name()))
        } else {
            String::new()
        };
        queries.push(format!(
            "ALTER TABLE {quoted_table} ALTER COLUMN {} TYPE {target}{using};",
            quote(column.name())
        ));
    }

    if !column.is_auto_increment()
        && !postgres_defaults_equal(
            column.default(),
            remote_column.default.as_deref(),
            column.family() == TypeFamily::Boolean,
        )
    {
        if column.has_default() {
            queries.push(format!(
                "ALTER TABLE {quoted_table} ALTER COLUMN {} SET DEFAULT {};",
                quote(column.name()),
                render_default(column.default())
            ));
        } else {
            queries.push(format!(
                "ALTER TABLE {quoted_table} ALTER COLUMN {} DROP DEFAULT;",
                quote(column.name())
            ));
        }
    }

    if column.is_nullable() != remote_column.nullable {
        let clause: &str = if column.is_nullable() {
            "DROP NOT NULL"
        } else {
            "SET NOT NULL"
        };
        queries.push(format!(
            "ALTER TABLE {quoted_table} ALTER COLUMN {} {clause};",
            quote(column.name())
        ));
    }

    if column.get_comment() != remote_column.comment {
        queries.push(render_column_comment(table, column.name(), column.get_comment()));
    }
}

fn reconcile_primary_key(
    descriptor: &ModelDescriptor,
    remote: &RemoteTable,
    quoted_table: &str,
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
        queries.push(format!(
            "ALTER TABLE {quoted_table} DROP CONSTRAINT {};",
            quote(&format!("{}_pkey", descriptor.table()))
        ));
    }

    if !wanted.is_empty() {
        let columns: Vec<String> = descriptor
            .primary_key_columns()
            .iter()
            .map(|c| quote(c.name()))
            .collect();
        queries.push(format!(
            "ALTER TABLE {quoted_table} ADD PRIMARY KEY({});",
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
    let mut wanted_names: Vec<String> = Vec::new();

    for index in descriptor.get_indexes() {
        let name: String = constrain_index_name(index.name(), INDEX_NAME_LIMIT);
        wanted_names.push(name.clone());

        match remote.find_index(&name, false) {
            None => queries.push(render_create_index(descriptor.table(), index)),
            Some(remote_index) => {
                if index.is_fulltext() {
                    // Expression indexes match by name only.
                    continue;
                }

                let columns_match: bool = remote_index.columns.len()
                    == index.column_names().len()
                    && remote_index
                        .columns
                        .iter()
                        .zip(index.column_names())
                        .all(|(a, b)| a.eq_ignore_ascii_case(b));

                if remote_index.unique != index.is_unique() || !columns_match {
                    queries.push(format!("DROP INDEX {};", quote(&remote_index.name)));
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
            if wanted_names.contains(&remote_index.name) {
                continue;
            }
            queries.push(format!("DROP INDEX {};", quote(&remote_index.name)));
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
