//! Error types for connection management.

use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur while opening, migrating or locking the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// Error reported by SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error (creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failed or the schema is newer than this build.
    #[error("migration error: {0}")]
    Migration(String),

    /// A thread panicked while holding the connection.
    #[error("database connection lock poisoned")]
    ConnectionPoisoned,
}
