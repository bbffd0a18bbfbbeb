//! The item API implementation.

use crate::{
    core::item::{
        item_model::{Item, ItemId, ItemPatch, NewItem},
        item_service::ItemService,
    },
    infra::{
        error::{ApiResult, ClientError},
        extract::Json,
        state::AppState,
    },
};
use axum::{extract::State, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

/// The item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_get(list_items)
        .typed_post(create_item)
        .typed_get(get_item)
        .typed_put(update_item)
        .typed_delete(delete_item)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items", rejection(ClientError))]
struct Items;

/// Kept as text, an id that is not a number simply matches no item.
#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/:id", rejection(ClientError))]
struct ItemsId(String);

/// Lists all items, newest first.
#[utoipa::path(
    get,
    path = "/items",
    responses(
        (status = 200, description = "Success", body = [Item]),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
async fn list_items(Items: Items, items: State<ItemService>) -> ApiResult<Json<Vec<Item>>> {
    let items = items.list_items().await?;
    Ok(Json(items))
}

/// Gets an item.
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "The item id")),
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
async fn get_item(ItemsId(id): ItemsId, items: State<ItemService>) -> ApiResult<Json<Item>> {
    let item = items.read_item(ItemId::parse(&id)).await?;
    Ok(Json(item))
}

/// Creates a new item.
#[utoipa::path(
    post,
    path = "/items",
    request_body = NewItem,
    responses(
        (status = 201, description = "Created", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
async fn create_item(
    Items: Items,
    items: State<ItemService>,
    Json(new_item): Json<NewItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = items.create_item(new_item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Updates an item.
///
/// Depending on configuration either both fields are replaced,
/// or only the fields present in the body.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "The item id")),
    request_body = ItemPatch,
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
async fn update_item(
    ItemsId(id): ItemsId,
    items: State<ItemService>,
    Json(patch): Json<ItemPatch>,
) -> ApiResult<Json<Item>> {
    let item = items.update_item(ItemId::parse(&id), patch).await?;
    Ok(Json(item))
}

/// Deletes an item.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "The item id")),
    responses(
        (status = 204, description = "No Content, whether or not the item existed"),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
async fn delete_item(ItemsId(id): ItemsId, items: State<ItemService>) -> ApiResult<StatusCode> {
    items.delete_item(ItemId::parse(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::{
        app::app,
        core::item::item_model::Item,
        infra::{
            config::{Config, InsertIdStrategy, UpdateMode},
            database::test_db,
            error::ErrorBody,
            state::AppState,
        },
    };
    use axum::{body::Body, Router};
    use http::{header::CONTENT_TYPE, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    async fn test_app(update_mode: UpdateMode, insert_id: InsertIdStrategy) -> Router {
        let mut config = Config::default();
        config.items.update_mode = update_mode;
        config.items.insert_id = insert_id;
        let state = AppState::new(test_db().await, &config.items);
        app(state, &config)
    }

    async fn partial_app() -> Router {
        test_app(UpdateMode::Partial, InsertIdStrategy::default()).await
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => req
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, T) {
        let (status, body) = send(app, method, uri, body).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn create(app: &Router, body: &str) -> Item {
        let (status, item) = send_json(app, "POST", "/items", Some(body)).await;
        assert_eq!(StatusCode::CREATED, status);
        item
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        for insert_id in [InsertIdStrategy::Returning, InsertIdStrategy::LastInsertRowid] {
            let app = test_app(UpdateMode::Partial, insert_id).await;
            let created = create(&app, r#"{"title": "Foo", "description": "Bar"}"#).await;
            assert_eq!("Foo", created.title);
            assert_eq!(Some("Bar".to_string()), created.description);

            let (status, item): (_, Item) =
                send_json(&app, "GET", &format!("/items/{}", created.id), None).await;
            assert_eq!(StatusCode::OK, status);
            assert_eq!(created, item);
        }
    }

    #[tokio::test]
    async fn list_is_in_descending_id_order() {
        let app = partial_app().await;
        let (status, items): (_, Vec<Item>) = send_json(&app, "GET", "/items", None).await;
        assert_eq!(StatusCode::OK, status);
        assert!(items.is_empty());

        for title in ["A", "B", "C", "D"] {
            create(&app, &format!(r#"{{"title": "{title}"}}"#)).await;
        }
        let (_, items): (_, Vec<Item>) = send_json(&app, "GET", "/items", None).await;
        assert_eq!(4, items.len());
        assert!(items.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!("D", items[0].title);
    }

    #[tokio::test]
    async fn missing_title_is_rejected_and_nothing_is_created() {
        let app = partial_app().await;
        for body in ["{}", r#"{"title": ""}"#, r#"{"title": null, "description": "x"}"#] {
            let (status, error): (_, ErrorBody) =
                send_json(&app, "POST", "/items", Some(body)).await;
            assert_eq!(StatusCode::BAD_REQUEST, status);
            assert_eq!("title is required", error.message());
        }
        let (_, items): (_, Vec<Item>) = send_json(&app, "GET", "/items", None).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let app = partial_app().await;
        let (status, _): (_, ErrorBody) = send_json(&app, "POST", "/items", Some("{ nope")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn bodies_without_a_json_content_type_are_accepted() {
        let app = partial_app().await;
        for content_type in [None, Some("text/plain")] {
            let mut req = Request::post("/items");
            if let Some(content_type) = content_type {
                req = req.header(CONTENT_TYPE, content_type);
            }
            let req = req.body(Body::from(r#"{"title": "B"}"#)).unwrap();
            let res = app.clone().oneshot(req).await.unwrap();
            assert_eq!(StatusCode::CREATED, res.status());
            let body = res.into_body().collect().await.unwrap().to_bytes();
            let item: Item = serde_json::from_slice(&body).unwrap();
            assert_eq!("B", item.title);
        }
    }

    #[tokio::test]
    async fn partial_update_preserves_untouched_fields() {
        let app = partial_app().await;
        let created = create(&app, r#"{"title": "A", "description": "B"}"#).await;
        let uri = format!("/items/{}", created.id);

        let (status, item): (_, Item) =
            send_json(&app, "PUT", &uri, Some(r#"{"title": "C"}"#)).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("C", item.title);
        assert_eq!(Some("B".to_string()), item.description);

        let (_, item): (_, Item) = send_json(&app, "GET", &uri, None).await;
        assert_eq!("C", item.title);
        assert_eq!(Some("B".to_string()), item.description);
    }

    #[tokio::test]
    async fn explicit_null_clears_but_omission_does_not() {
        let app = partial_app().await;
        let created = create(&app, r#"{"title": "A", "description": "B"}"#).await;
        let uri = format!("/items/{}", created.id);

        let (_, item): (_, Item) = send_json(&app, "PUT", &uri, Some(r#"{"title": "A2"}"#)).await;
        assert_eq!(Some("B".to_string()), item.description);

        let (_, item): (_, Item) =
            send_json(&app, "PUT", &uri, Some(r#"{"description": null}"#)).await;
        assert_eq!("A2", item.title);
        assert_eq!(None, item.description);
    }

    #[tokio::test]
    async fn partial_update_needs_a_known_field() {
        let app = partial_app().await;
        let created = create(&app, r#"{"title": "A"}"#).await;
        let uri = format!("/items/{}", created.id);
        for body in ["{}", r#"{"id": 5, "color": "red"}"#, r#"{"title": null}"#] {
            let (status, _): (_, ErrorBody) = send_json(&app, "PUT", &uri, Some(body)).await;
            assert_eq!(StatusCode::BAD_REQUEST, status);
        }
    }

    #[tokio::test]
    async fn full_update_requires_a_title_and_replaces_both_fields() {
        let app = test_app(UpdateMode::Full, InsertIdStrategy::default()).await;
        let created = create(&app, r#"{"title": "A", "description": "B"}"#).await;
        let uri = format!("/items/{}", created.id);

        let (status, error): (_, ErrorBody) = send_json(&app, "PUT", &uri, Some("{}")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("title is required", error.message());

        let (status, item): (_, Item) =
            send_json(&app, "PUT", &uri, Some(r#"{"title": "C"}"#)).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("C", item.title);
        assert_eq!(None, item.description);
    }

    #[tokio::test]
    async fn missing_items_are_not_found() {
        let app = partial_app().await;
        let created = create(&app, r#"{"title": "A"}"#).await;
        let uri = format!("/items/{}", created.id);
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(StatusCode::NO_CONTENT, status);

        for uri in [uri.as_str(), "/items/999999", "/items/abc"] {
            let (status, error): (_, ErrorBody) = send_json(&app, "GET", uri, None).await;
            assert_eq!(StatusCode::NOT_FOUND, status);
            assert_eq!("Not found", error.message());
            let (status, _): (_, ErrorBody) =
                send_json(&app, "PUT", uri, Some(r#"{"title": "B"}"#)).await;
            assert_eq!(StatusCode::NOT_FOUND, status);
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = partial_app().await;
        let created = create(&app, r#"{"title": "A"}"#).await;
        let uri = format!("/items/{}", created.id);
        for uri in [uri.as_str(), uri.as_str(), "/items/999999", "/items/abc"] {
            let (status, body) = send(&app, "DELETE", uri, None).await;
            assert_eq!(StatusCode::NO_CONTENT, status);
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn sql_metacharacters_are_stored_verbatim() {
        let app = partial_app().await;
        let other = create(&app, r#"{"title": "Other", "description": "Untouched"}"#).await;
        let title = "Robert'); DROP TABLE items;--";
        let body = serde_json::json!({ "title": title }).to_string();
        let created = create(&app, &body).await;
        assert_eq!(title, created.title);

        let (_, items): (_, Vec<Item>) = send_json(&app, "GET", "/items", None).await;
        assert_eq!(vec![created, other], items);
    }

    #[tokio::test]
    async fn store_failures_are_internal_errors_with_the_message() {
        let db = test_db().await;
        let config = Config::default();
        let app = app(AppState::new(db.clone(), &config.items), &config);
        sqlx::query("DROP TABLE items").execute(&db).await.unwrap();

        let (status, error): (_, ErrorBody) = send_json(&app, "GET", "/items", None).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
        assert!(error.message().contains("no such table"));
    }
}
