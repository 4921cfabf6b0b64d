pub mod health;
pub mod villa;
pub mod villa_number;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /villas              villa CRUD + patch
/// /villa-numbers       villa number CRUD + patch
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/villas", villa::router())
        .nest("/villa-numbers", villa_number::router())
}
