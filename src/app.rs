//! The axum application.
//!
//! # Examples
//!
//! Create an item and read it back.
//!
//! ```rust,no_run
//! # use items_api::core::item::item_model::{Item, NewItem};
//! # async fn example() -> Result<(), reqwest::Error> {
//! # let url = "http://127.0.0.1:8080";
//! let client = reqwest::Client::new();
//! let created: Item = client
//!     .post(format!("{url}/items"))
//!     .json(&NewItem::titled("Foo"))
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! let item: Item = reqwest::get(format!("{url}/items/{}", created.id)).await?.json().await?;
//! assert_eq!(created, item);
//! # Ok(())
//! # }
//! ```

use std::iter;

use crate::infra::config::Config;
use crate::infra::database::DbPool;
use crate::infra::error::{ClientError, InternalError, PanicHandler};
use crate::infra::middleware::{cors_layer, log_request_response, MakeRequestIdSpan};
use crate::infra::shutdown::shutdown_signal;
use crate::infra::state::AppState;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Router};
use http::header::AUTHORIZATION;
use http::StatusCode;
use tokio::net::TcpListener;
use tower::timeout::error::Elapsed;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Constructs the full axum application.
pub fn app(state: AppState, config: &Config) -> Router {
    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .concurrency_limit(config.server.concurrency_limit)
        .timeout(config.server.request_timeout);

    let router = crate::api::api(state)
        // Layers
        .layer(axum::middleware::from_fn(log_request_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new(iter::once(
            AUTHORIZATION,
        )))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler));

    // Outermost, so preflight requests are answered before anything else runs.
    match cors_layer(&config.cors) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

async fn handle_middleware_error(e: BoxError) -> Response {
    if e.is::<Elapsed>() {
        ClientError::Custom(StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
            .into_response()
    } else {
        InternalError::Other(format!("Tower middleware failed: {e}")).into_response()
    }
}

/// Starts the axum server and runs it until ctrl-c is pressed.
pub async fn run_app(listener: TcpListener, db: DbPool, config: Config) -> std::io::Result<()> {
    let state = AppState::new(db, &config.items);
    let app = app(state, &config).into_make_service();

    tracing::info!("Starting axum on {}", listener.local_addr()?);
    let exit_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match &exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }

    exit_result
}

/// Spawn a server on a random port with a custom database.
pub async fn spawn_app_with_db(db: DbPool, config: Config) -> std::io::Result<String> {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(run_app(listener, db, config));
    Ok(format!("http://{address}:{port}"))
}
