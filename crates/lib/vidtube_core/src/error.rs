//! Domain error taxonomy.
//!
//! Every fallible core operation returns `Result<T, Error>`; the API layer
//! maps these onto HTTP status codes and the error envelope.

use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, malformed, or expired access credential.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Refresh-token mismatch, reuse, or tamper. Deliberately carries no
    /// detail about which check failed.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Duplicate unique key (handle/email already taken, etc).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Blob store or other external collaborator failure.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Db(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Error::NotFound("row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("duplicate key".into())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Error::NotFound("referenced entity absent".into())
            }
            _ => Error::Db(e),
        }
    }
}
