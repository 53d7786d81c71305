// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::users_descriptor;
use crate::{Column, Index, MigrationEntry, Model, ModelDescriptor, SchemaError, TypeFamily};

#[test]
fn test_validate_accepts_well_formed_descriptor() {
    let descriptor: ModelDescriptor = users_descriptor();
    assert!(descriptor.validate().is_ok());
}

#[test]
fn test_validate_rejects_empty_table_name() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("").column(Column::new("id", "int"));
    assert_eq!(descriptor.validate(), Err(SchemaError::MissingTableName));
}

#[test]
fn test_validate_rejects_descriptor_without_columns() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("users");
    assert_eq!(
        descriptor.validate(),
        Err(SchemaError::NoColumns(String::from("users")))
    );
}

#[test]
fn test_validate_rejects_duplicate_columns_case_insensitively() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("users")
        .column(Column::new("Email", "varchar"))
        .column(Column::new("email", "varchar"));
    assert_eq!(
        descriptor.validate(),
        Err(SchemaError::DuplicateColumn {
            table: String::from("users"),
            column: String::from("email"),
        })
    );
}

#[test]
fn test_validate_rejects_auto_increment_without_primary_key() {
    let descriptor: ModelDescriptor =
        ModelDescriptor::new("users").column(Column::new("id", "int").auto_increment());
    assert_eq!(
        descriptor.validate(),
        Err(SchemaError::InvalidAutoIncrement {
            table: String::from("users"),
            column: String::from("id"),
        })
    );
}

#[test]
fn test_validate_rejects_auto_increment_on_text_column() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("users")
        .column(Column::new("id", "varchar").primary_key().auto_increment());
    assert!(matches!(
        descriptor.validate(),
        Err(SchemaError::InvalidAutoIncrement { .. })
    ));
}

#[test]
fn test_validate_rejects_malformed_foreign_key_target() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("profiles")
        .column(Column::new("user_id", "int").references("users.id.extra"));
    assert!(matches!(
        descriptor.validate(),
        Err(SchemaError::InvalidForeignKey { .. })
    ));
}

#[test]
fn test_validate_accepts_table_and_table_column_foreign_keys() {
    let bare: ModelDescriptor = ModelDescriptor::new("profiles")
        .column(Column::new("user_id", "int").references("users"));
    let qualified: ModelDescriptor = ModelDescriptor::new("profiles")
        .column(Column::new("user_id", "int").references("users.id"));

    assert!(bare.validate().is_ok());
    assert!(qualified.validate().is_ok());
}

#[test]
fn test_validate_rejects_index_over_unknown_column() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("users")
        .column(Column::new("id", "int"))
        .index(Index::new("idx_missing").columns(&["missing"]));
    assert_eq!(
        descriptor.validate(),
        Err(SchemaError::UnknownIndexColumn {
            table: String::from("users"),
            index: String::from("idx_missing"),
            column: String::from("missing"),
        })
    );
}

#[test]
fn test_from_model_materializes_unique_indexes() {
    let descriptor: ModelDescriptor =
        ModelDescriptor::from_model(&users_descriptor()).unwrap();

    let index = descriptor
        .get_indexes()
        .iter()
        .find(|i| i.name() == "idx_unique_email")
        .expect("implicit unique index should be materialized");
    assert!(index.is_unique());
    assert_eq!(index.column_names(), [String::from("email")]);
}

#[test]
fn test_from_model_does_not_duplicate_existing_unique_index() {
    let model: ModelDescriptor = ModelDescriptor::new("users")
        .column(Column::new("email", "varchar").unique())
        .index(Index::new("idx_unique_email").unique().columns(&["email"]));
    let descriptor: ModelDescriptor = ModelDescriptor::from_model(&model).unwrap();

    let count: usize = descriptor
        .get_indexes()
        .iter()
        .filter(|i| i.name() == "idx_unique_email")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_from_model_applies_column_definition_callback() {
    struct Audited;

    impl Model for Audited {
        fn table_name(&self) -> String {
            String::from("audited")
        }

        fn columns(&self) -> Vec<Column> {
            vec![Column::new("id", "int").primary_key(), Column::new("note", "text")]
        }

        fn column_definition(&self, column: &mut Column) {
            if column.name() == "note" {
                *column = column.clone().comment("free-form note");
            }
        }
    }

    let descriptor: ModelDescriptor = ModelDescriptor::from_model(&Audited).unwrap();
    assert_eq!(
        descriptor.find_column("note").unwrap().get_comment(),
        "free-form note"
    );
}

#[test]
fn test_primary_key_columns_preserve_declaration_order() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("memberships")
        .column(Column::new("group_id", "int").primary_key())
        .column(Column::new("user_id", "int").primary_key())
        .column(Column::new("role", "varchar").size(32));

    let names: Vec<&str> = descriptor
        .primary_key_columns()
        .iter()
        .map(|c| c.name())
        .collect();
    assert_eq!(names, ["group_id", "user_id"]);
}

#[test]
fn test_migration_entries_preserve_input_order() {
    let descriptor: ModelDescriptor = ModelDescriptor::new("logs")
        .column(Column::new("id", "int").primary_key())
        .migration("1.0.0", "ALTER TABLE logs ADD COLUMN session_id varchar(255);")
        .migration("1.1.0", "ALTER TABLE logs ADD COLUMN trace_id varchar(255);");

    let versions: Vec<&str> = descriptor
        .get_migrations()
        .iter()
        .map(MigrationEntry::version)
        .collect();
    assert_eq!(versions, ["1.0.0", "1.1.0"]);
}

#[test]
fn test_type_family_classification() {
    assert_eq!(TypeFamily::of("int(11)"), TypeFamily::Integer);
    assert_eq!(TypeFamily::of("BIGINT"), TypeFamily::Integer);
    assert_eq!(TypeFamily::of("varchar(255)"), TypeFamily::Text);
    assert_eq!(TypeFamily::of("bool"), TypeFamily::Boolean);
    assert_eq!(TypeFamily::of("timestamptz"), TypeFamily::Timestamp);
    assert_eq!(TypeFamily::of("date"), TypeFamily::Date);
    assert_eq!(TypeFamily::of("jsonb"), TypeFamily::Json);
    assert_eq!(TypeFamily::of("enum"), TypeFamily::Enum);
    assert_eq!(TypeFamily::of("geometry"), TypeFamily::Unknown);
}
