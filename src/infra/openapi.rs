//! OpenAPI configuration.

use super::{extract::Json, state::AppState};
use crate::{
    api::{health::health_api, item::item_api},
    core::item::item_model,
};
use axum::{routing::get, Router};
use utoipa::OpenApi;

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    paths(
        health_api::health,
        item_api::list_items,
        item_api::get_item,
        item_api::create_item,
        item_api::update_item,
        item_api::delete_item,
    ),
    components(
        schemas(
            item_model::Item,
            item_model::NewItem,
            item_model::ItemPatch,
            crate::infra::error::ErrorBody
        )
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;

/// Serves the document at `/openapi.json`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
