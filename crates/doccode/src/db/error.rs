//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from registry storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Document already registered: {0}")]
    DuplicatePath(String),

    #[error("Code already allocated: {0}")]
    DuplicateCode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The registry was closed; no further calls are accepted.
    #[error("Registry is closed")]
    Closed,
}

impl DatabaseError {
    /// True when SQLite rejected the statement for a UNIQUE/PRIMARY KEY clash.
    pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}
