use serde::Serialize;

use crate::types::DbId;

/// Message carried by every failed parent lookup, whether caught by the
/// application check or by the store's foreign key.
pub const INVALID_PARENT_REFERENCE: &str = "parent reference is invalid";

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A single-result query matched more than one row.
    #[error("Ambiguous result: more than one {entity} matched a single-result query")]
    AmbiguousResult { entity: &'static str },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Rejected: {} violation(s)", .0.len())]
    Rejected(Vec<FieldViolation>),

    /// Transport to the backing store failed. Safe to retry.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for the parent-reference constraint violation.
    pub fn invalid_parent() -> Self {
        CoreError::ConstraintViolation(INVALID_PARENT_REFERENCE.to_string())
    }

    /// Whether resubmitting the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

/// A single field-level problem found while merging or validating a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Rejected(violations_from(&errors))
    }
}

/// Flatten `validator` errors into field violations, sorted by field name so
/// the output is stable across runs.
pub fn violations_from(errors: &validator::ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed `{}` check", e.code));
                FieldViolation::new(field.to_string(), message)
            })
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}
