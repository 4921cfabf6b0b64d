//! Request handlers for villas and villa numbers.
//!
//! Each submodule provides async handler functions (list, get, create,
//! update, patch, delete) for a single entity type. Handlers delegate to the
//! corresponding repository in `villa_db` and map errors via [`AppError`].

pub mod villa;
pub mod villa_number;

use villa_core::error::CoreError;
use villa_core::types::{is_sentinel, DbId};

use crate::error::{AppError, AppResult};

/// Reject the reserved identifier `0` before any repository call.
pub(crate) fn reject_sentinel(id: DbId) -> AppResult<()> {
    if is_sentinel(id) {
        tracing::warn!(id, "Request used the reserved identifier");
        return Err(AppError::Core(CoreError::Validation(
            "identifier 0 is reserved".to_string(),
        )));
    }
    Ok(())
}

/// Reject a full update whose body identifier differs from the path.
pub(crate) fn ensure_same_id(path_id: DbId, body_id: DbId) -> AppResult<()> {
    if path_id != body_id {
        return Err(AppError::BadRequest(format!(
            "path id {path_id} does not match body id {body_id}"
        )));
    }
    Ok(())
}
