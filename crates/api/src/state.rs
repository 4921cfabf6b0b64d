/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted internally. Handlers
/// hold no other shared state; configuration is consumed while building the
/// router and server.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: villa_db::DbPool,
}
