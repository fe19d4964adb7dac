pub mod health;
pub mod safety_pool;
pub mod vaults;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(vaults::router())
        .merge(safety_pool::router())
        .with_state(state)
}
