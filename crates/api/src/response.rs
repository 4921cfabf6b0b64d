//! Shared response envelope types for API handlers.
//!
//! All successful API responses with a body use a `{ "data": ... }`
//! envelope. Each response value is built once, at the end of a handler,
//! and never mutated afterwards. Error bodies are produced by
//! [`AppError`](crate::error::AppError).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: villas }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
