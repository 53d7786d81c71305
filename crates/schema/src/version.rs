// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Version-string comparison for version-scoped migrations.
//!
//! Table versions are free-form dotted strings (`1.0.0`, `2.1`, `3`).
//! Comparison is semver-style: components are compared left-to-right
//! numerically, missing components count as zero, and non-numeric
//! components count as zero.

use std::cmp::Ordering;

/// The version written into a table's comment slot at creation time.
pub const INITIAL_VERSION: &str = "0.0.0";

/// The wildcard tag that matches on every run.
pub const VERSION_WILDCARD: &str = "*";

/// Compares two dotted version strings numerically.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<u64> = components(a);
    let right: Vec<u64> = components(b);
    let len: usize = left.len().max(right.len());

    for i in 0..len {
        let l: u64 = left.get(i).copied().unwrap_or(0);
        let r: u64 = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    Ordering::Equal
}

fn components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}
