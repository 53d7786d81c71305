// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod descriptor_tests;
mod index_tests;
mod version_tests;

use crate::{Column, ModelDescriptor};

/// Builds the descriptor used across test modules: a `users` table with an
/// auto-increment primary key, a unique email and a timestamp.
pub fn users_descriptor() -> ModelDescriptor {
    ModelDescriptor::new("users")
        .column(Column::new("id", "int").primary_key().auto_increment())
        .column(Column::new("email", "varchar").size(255).unique().not_null())
        .column(
            Column::new("created_at", "timestamp")
                .not_null()
                .default_value("CURRENT_TIMESTAMP"),
        )
}
