//! Liveness endpoint.

use crate::infra::state::AppState;
use axum::{routing::get, Router};

/// The text returned by the health endpoint.
pub const HEALTH_MARKER: &str = "items-api is up";

/// The health endpoint.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// Returns a plain text marker as long as the server accepts requests.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Success", body = String, content_type = "text/plain"),
    )
)]
pub async fn health() -> &'static str {
    HEALTH_MARKER
}
