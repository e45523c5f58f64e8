//! Error types for the store layer.

use std::fmt;

use eavstore_db::DbError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Every variant is recoverable; none of them leave partial writes behind.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced entity, property or instance does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A unique value is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// None of the supplied property/value pairs resolved against the entity.
    #[error("no valid properties provided")]
    NoValidProperties,

    /// Connection-level failure (open, migrate, lock).
    #[error(transparent)]
    Database(#[from] DbError),

    /// Query failure reported by SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for errors caused by the caller's input rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Sqlite(_))
    }
}
