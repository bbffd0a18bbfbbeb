//! The HTTP endpoints.

use axum::Router;

use crate::infra::state::AppState;

pub mod health;
pub mod item;

/// Constructs the full API, without middleware.
pub fn api(state: AppState) -> Router {
    Router::new()
        .merge(health::health_api::routes())
        .merge(item::item_api::routes())
        .merge(crate::infra::openapi::routes())
        .with_state(state)
}
