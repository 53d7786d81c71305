// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Default-value comparison.
//!
//! Catalogs echo defaults back in many spellings (`now()`,
//! `CURRENT_TIMESTAMP()`, `'0'::smallint`, `t`), so literal comparison
//! between a descriptor default and a remote default would re-issue a
//! `MODIFY`/`SET DEFAULT` on every run. Comparison therefore goes through a
//! normalization table that groups equivalent spellings.

/// Strips one layer of matching surrounding quotes.
fn strip_quotes(value: &str) -> &str {
    let trimmed: &str = value.trim();
    if trimmed.len() >= 2 {
        let bytes: &[u8] = trimmed.as_bytes();
        let first: u8 = bytes[0];
        let last: u8 = bytes[trimmed.len() - 1];
        if first == last && (first == b'\'' || first == b'"' || first == b'`') {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Normalizes a default spelling into its comparison form.
///
/// Groups: `CURRENT_TIMESTAMP` / `CURRENT_TIMESTAMP(n)` / `NOW()`,
/// `CURRENT_DATE` / `CURRENT_DATE()`, and `NULL` / `null`. Everything else
/// passes through with surrounding quotes stripped.
fn normalize(value: &str) -> String {
    let stripped: &str = strip_quotes(value);
    let upper: String = stripped.to_uppercase();

    if upper == "NOW()" || upper == "CURRENT_TIMESTAMP" || upper.starts_with("CURRENT_TIMESTAMP(") {
        return String::from("CURRENT_TIMESTAMP");
    }
    if upper == "CURRENT_DATE" || upper == "CURRENT_DATE()" {
        return String::from("CURRENT_DATE");
    }
    if upper == "NULL" {
        return String::from("NULL");
    }

    stripped.to_string()
}

/// Compares a descriptor default against a MySQL catalog default.
///
/// An absent remote default matches an unspecified descriptor default and
/// the zero-date `0000-00-00 00:00:00`.
#[must_use]
pub(crate) fn mysql_defaults_equal(model: &str, remote: Option<&str>) -> bool {
    let remote_value: &str = remote.unwrap_or("");
    if remote_value.is_empty() {
        return model.is_empty() || model == "0000-00-00 00:00:00";
    }
    if model.is_empty() {
        // The catalog may surface an implicit default the model never
        // asked for; that is not drift.
        return true;
    }

    normalize(model) == normalize(remote_value)
}

/// Strips a PostgreSQL `::typecast` suffix (`'0'::smallint` → `'0'`).
fn strip_pg_cast(value: &str) -> &str {
    value.find("::").map_or(value, |pos| &value[..pos])
}

/// Normalizes PostgreSQL boolean spellings to `true`/`false`.
fn normalize_pg_bool(value: &str) -> Option<&'static str> {
    match value.to_lowercase().as_str() {
        "t" | "1" | "true" => Some("true"),
        "f" | "0" | "false" => Some("false"),
        _ => None,
    }
}

/// Compares a descriptor default against a PostgreSQL catalog default.
#[must_use]
pub(crate) fn postgres_defaults_equal(model: &str, remote: Option<&str>, boolean: bool) -> bool {
    let remote_value: &str = remote.unwrap_or("");
    if remote_value.is_empty() {
        return model.is_empty();
    }
    if model.is_empty() {
        // Remote carries a default the model does not want: DROP DEFAULT.
        return false;
    }

    let model_norm: String = normalize(strip_pg_cast(model));
    let remote_norm: String = normalize(strip_pg_cast(remote_value));

    if boolean {
        if let (Some(m), Some(r)) = (
            normalize_pg_bool(&model_norm),
            normalize_pg_bool(&remote_norm),
        ) {
            return m == r;
        }
    }

    model_norm == remote_norm
}
