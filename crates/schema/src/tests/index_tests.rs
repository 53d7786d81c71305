// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::constrain_index_name;

#[test]
fn test_short_names_pass_through() {
    assert_eq!(constrain_index_name("idx_users_email", 64), "idx_users_email");
}

#[test]
fn test_name_at_limit_passes_through() {
    let name: String = "a".repeat(63);
    assert_eq!(constrain_index_name(&name, 63), name);
}

#[test]
fn test_long_names_are_truncated_with_hash_suffix() {
    let name: String = format!("idx_{}", "column_".repeat(20));
    let constrained: String = constrain_index_name(&name, 64);

    assert_eq!(constrained.len(), 64);
    assert!(name.starts_with(&constrained[..55]));
    assert_eq!(constrained.as_bytes()[55], b'_');
}

#[test]
fn test_constraining_is_deterministic() {
    let name: String = format!("idx_{}", "very_long_segment_".repeat(10));
    assert_eq!(
        constrain_index_name(&name, 63),
        constrain_index_name(&name, 63)
    );
}

#[test]
fn test_distinct_names_get_distinct_suffixes() {
    let base: String = "shared_prefix_".repeat(10);
    let first: String = constrain_index_name(&format!("{base}one"), 64);
    let second: String = constrain_index_name(&format!("{base}two"), 64);

    assert_ne!(first, second);
    // Truncated heads collide; the hash suffix is what keeps them apart.
    assert_eq!(first[..55], second[..55]);
}
