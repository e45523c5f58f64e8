//! Shared helpers for the store modules.

use rusqlite::{ffi, ErrorCode};

use crate::{StoreError, StoreResult};

/// Longest accepted entity or property name, in characters.
pub const MAX_NAME_LEN: usize = 255;

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Trims a caller-supplied name and checks it is non-empty and short enough.
pub(crate) fn check_name(kind: &str, name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation(format!("{kind} name is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::Validation(format!(
            "{kind} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

/// Maps constraint violations to store errors; `on_unique` builds the
/// conflict for the statement at hand.
pub(crate) fn map_constraint(
    err: rusqlite::Error,
    on_unique: impl FnOnce() -> StoreError,
) -> StoreError {
    match constraint_code(&err) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => on_unique(),
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            StoreError::Validation("referenced row does not exist".to_string())
        }
        _ => StoreError::Sqlite(err),
    }
}
