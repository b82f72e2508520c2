use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the store and the reconciliation engine.
///
/// "No such row" is never one of them: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("directory is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

impl DbError {
    /// True when SQLite rejected a write because of a UNIQUE, FOREIGN KEY,
    /// NOT NULL or similar constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
