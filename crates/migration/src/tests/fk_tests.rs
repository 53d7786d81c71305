// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use altar_schema::{Column, ModelDescriptor};

use crate::fk::{ResolvedForeignKey, constraint_name, resolve_foreign_keys};
use crate::remote::{RemoteForeignKey, RemoteSchema, RemoteTable};
use crate::tests::{schema_of, users_descriptor, users_remote_mysql};

fn profiles_descriptor() -> ModelDescriptor {
    ModelDescriptor::from_model(
        &ModelDescriptor::new("profiles")
            .column(Column::new("id", "int").primary_key().auto_increment())
            .column(Column::new("user_id", "int").not_null().references("users")),
    )
    .unwrap()
}

#[test]
fn test_constraint_name_is_deterministic_and_fk_prefixed() {
    let first: String = constraint_name("profiles", "user_id", "users", "id");
    let second: String = constraint_name("profiles", "user_id", "users", "id");

    assert_eq!(first, second);
    assert!(first.starts_with("fk_"));
    assert_eq!(first.len(), 3 + 32);
}

#[test]
fn test_distinct_endpoints_get_distinct_names() {
    let by_user: String = constraint_name("profiles", "user_id", "users", "id");
    let by_group: String = constraint_name("profiles", "group_id", "groups", "id");
    assert_ne!(by_user, by_group);
}

#[test]
fn test_bare_table_target_resolves_against_sibling_descriptor() {
    let profiles: ModelDescriptor = profiles_descriptor();
    let descriptors: Vec<ModelDescriptor> = vec![users_descriptor(), profiles.clone()];

    let resolved: Vec<ResolvedForeignKey> =
        resolve_foreign_keys(&profiles, &descriptors, &RemoteSchema::new());

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].referenced_table, "users");
    assert_eq!(resolved[0].referenced_column, "id");
    assert_eq!(resolved[0].on_delete, "CASCADE");
    assert_eq!(resolved[0].on_update, "CASCADE");
}

#[test]
fn test_bare_table_target_resolves_against_remote_schema() {
    let profiles: ModelDescriptor = profiles_descriptor();
    let remote: RemoteSchema = schema_of(vec![users_remote_mysql()]);

    let resolved: Vec<ResolvedForeignKey> =
        resolve_foreign_keys(&profiles, std::slice::from_ref(&profiles), &remote);

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].referenced_column, "id");
}

#[test]
fn test_qualified_target_splits_literally() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("profiles").column(
            Column::new("owner_email", "varchar")
                .size(255)
                .references("users.email"),
        ),
    )
    .unwrap();

    let resolved: Vec<ResolvedForeignKey> = resolve_foreign_keys(
        &descriptor,
        std::slice::from_ref(&descriptor),
        &RemoteSchema::new(),
    );

    assert_eq!(resolved[0].referenced_table, "users");
    assert_eq!(resolved[0].referenced_column, "email");
}

#[test]
fn test_unresolvable_target_is_skipped() {
    let profiles: ModelDescriptor = profiles_descriptor();

    // No sibling descriptor and no remote table: nothing to point at.
    let resolved: Vec<ResolvedForeignKey> = resolve_foreign_keys(
        &profiles,
        std::slice::from_ref(&profiles),
        &RemoteSchema::new(),
    );
    assert!(resolved.is_empty());
}

#[test]
fn test_existing_remote_constraint_is_skipped() {
    let profiles: ModelDescriptor = profiles_descriptor();
    let descriptors: Vec<ModelDescriptor> = vec![users_descriptor(), profiles.clone()];

    let remote_profiles: RemoteTable = RemoteTable {
        name: String::from("profiles"),
        foreign_keys: vec![RemoteForeignKey {
            name: String::from("fk_existing"),
            column: String::from("user_id"),
            referenced_table: String::from("users"),
            referenced_column: String::from("id"),
        }],
        ..RemoteTable::default()
    };
    let remote: RemoteSchema = schema_of(vec![users_remote_mysql(), remote_profiles]);

    let resolved: Vec<ResolvedForeignKey> =
        resolve_foreign_keys(&profiles, &descriptors, &remote);
    assert!(resolved.is_empty());
}

#[test]
fn test_referential_action_overrides() {
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(
        &ModelDescriptor::new("profiles").column(
            Column::new("user_id", "int")
                .references("users.id")
                .on_delete("SET NULL")
                .on_update("RESTRICT"),
        ),
    )
    .unwrap();

    let resolved: Vec<ResolvedForeignKey> = resolve_foreign_keys(
        &descriptor,
        std::slice::from_ref(&descriptor),
        &RemoteSchema::new(),
    );

    assert_eq!(resolved[0].on_delete, "SET NULL");
    assert_eq!(resolved[0].on_update, "RESTRICT");
}
