//! Classification of store errors at the repository boundary.
//!
//! Repositories never hand raw `sqlx::Error`s to callers; every failure is
//! turned into a [`CoreError`] variant so the transport layer can pick a
//! status code without inspecting database internals.

use villa_core::error::CoreError;

/// Result type returned by every repository operation.
pub type RepoResult<T> = Result<T, CoreError>;

/// PostgreSQL SQLSTATE codes the repository reacts to.
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const CHECK_VIOLATION: &str = "23514";
    /// Class 08: connection exception.
    pub const CONNECTION_CLASS: &str = "08";
}

/// Map a sqlx error onto the domain error taxonomy.
///
/// - Unique violations and check/not-null violations become
///   `ConstraintViolation` with the offending constraint named.
/// - Foreign key violations become the fixed "parent reference is invalid"
///   violation, matching the application-level parent check.
/// - Pool exhaustion, I/O, TLS and connection-class failures become
///   `StoreUnavailable`, the only retryable condition.
/// - Everything else is `Internal`.
pub fn store_error(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            match code.as_deref() {
                Some(sqlstate::UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    CoreError::ConstraintViolation(format!(
                        "duplicate value violates unique constraint: {constraint}"
                    ))
                }
                Some(sqlstate::FOREIGN_KEY_VIOLATION) => CoreError::invalid_parent(),
                Some(sqlstate::NOT_NULL_VIOLATION) | Some(sqlstate::CHECK_VIOLATION) => {
                    CoreError::ConstraintViolation(db_err.message().to_string())
                }
                Some(c) if c.starts_with(sqlstate::CONNECTION_CLASS) => {
                    tracing::warn!(error = %db_err, "Store connection failure");
                    CoreError::StoreUnavailable(db_err.message().to_string())
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    CoreError::Internal(db_err.message().to_string())
                }
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => {
            tracing::warn!(error = %err, "Store unavailable");
            CoreError::StoreUnavailable(err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            CoreError::Internal(err.to_string())
        }
    }
}
