//! Route definitions for the `/villa-numbers` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::villa_number;
use crate::state::AppState;

/// Routes mounted at `/villa-numbers`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /{no}      -> get_by_no
/// PUT    /{no}      -> update
/// PATCH  /{no}      -> patch
/// DELETE /{no}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(villa_number::list).post(villa_number::create))
        .route(
            "/{no}",
            get(villa_number::get_by_no)
                .put(villa_number::update)
                .patch(villa_number::patch)
                .delete(villa_number::delete),
        )
}
