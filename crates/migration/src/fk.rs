// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Foreign-key target resolution and constraint naming.
//!
//! Foreign-key clauses are collected into a deferred tail that runs after
//! every table's CREATE/ALTER statements, so reference targets exist by the
//! time the constraints are added. Resolution and naming are shared by both
//! dialects; only the rendered SQL differs.

use sha2::{Digest, Sha256};
use tracing::warn;

use altar_schema::{Column, ModelDescriptor};

use crate::remote::RemoteSchema;

/// Default referential action when a column does not override it.
pub(crate) const DEFAULT_REFERENTIAL_ACTION: &str = "CASCADE";

/// A fully resolved foreign key, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedForeignKey {
    pub name: String,
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: String,
    pub on_update: String,
}

/// Derives the deterministic constraint name for a foreign key.
///
/// The name is `fk_` plus the first 32 lower-hex characters of the SHA-256
/// digest of `"<srcTable>.<srcCol>_<dstTable>.<dstCol>"`, identical across
/// runs for a fixed endpoint pair.
#[must_use]
pub(crate) fn constraint_name(
    table: &str,
    column: &str,
    referenced_table: &str,
    referenced_column: &str,
) -> String {
    let key: String = format!("{table}.{column}_{referenced_table}.{referenced_column}");
    let digest = Sha256::digest(key.as_bytes());
    let hash: String = hex::encode(digest);
    format!("fk_{}", &hash[..32])
}

/// Resolves every foreign-key attribute on a descriptor.
///
/// A `table.column` target splits literally. A bare `table` target resolves
/// to that table's primary-key column, looked up first among the sibling
/// descriptors of the run and then in the remote schema; targets without a
/// discoverable primary key are skipped with a warning. Constraints already
/// present remotely (by name or by equivalent endpoints) are skipped.
pub(crate) fn resolve_foreign_keys(
    descriptor: &ModelDescriptor,
    descriptors: &[ModelDescriptor],
    remote: &RemoteSchema,
) -> Vec<ResolvedForeignKey> {
    let mut resolved: Vec<ResolvedForeignKey> = Vec::new();

    for column in descriptor.get_columns() {
        let Some(target) = column.foreign_key() else {
            continue;
        };

        let Some((referenced_table, referenced_column)) =
            resolve_target(target, descriptors, remote)
        else {
            warn!(
                "Skipping foreign key on {}.{}: no primary key found for target '{}'",
                descriptor.table(),
                column.name(),
                target
            );
            continue;
        };

        let name: String = constraint_name(
            descriptor.table(),
            column.name(),
            &referenced_table,
            &referenced_column,
        );

        if let Some(remote_table) = remote.get(descriptor.table()) {
            if remote_table.has_foreign_key(
                &name,
                column.name(),
                &referenced_table,
                &referenced_column,
            ) {
                continue;
            }
        }

        resolved.push(ResolvedForeignKey {
            name,
            table: descriptor.table().to_string(),
            column: column.name().to_string(),
            referenced_table,
            referenced_column,
            on_delete: action(column.on_delete_action()),
            on_update: action(column.on_update_action()),
        });
    }

    resolved
}

fn action(value: Option<&str>) -> String {
    value.map_or_else(|| String::from(DEFAULT_REFERENTIAL_ACTION), str::to_string)
}

fn resolve_target(
    target: &str,
    descriptors: &[ModelDescriptor],
    remote: &RemoteSchema,
) -> Option<(String, String)> {
    if let Some((table, column)) = target.split_once('.') {
        return Some((table.to_string(), column.to_string()));
    }

    // Bare table: resolve to its primary-key column, descriptors first so
    // a table created in this very run still resolves.
    if let Some(sibling) = descriptors
        .iter()
        .find(|d| d.table().eq_ignore_ascii_case(target))
    {
        let keys: Vec<&Column> = sibling.primary_key_columns();
        if let Some(first) = keys.first() {
            return Some((sibling.table().to_string(), first.name().to_string()));
        }
    }

    if let Some(remote_table) = remote.get(target) {
        if let Some(first) = remote_table.primary_key.first() {
            return Some((remote_table.name.clone(), first.clone()));
        }
    }

    None
}
