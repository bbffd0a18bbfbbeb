//! Middleware for modifying requests and responses.

use super::{
    config::CorsConfig,
    error::{ApiError, InternalError},
};
use axum::{body::Body, middleware::Next, response::IntoResponse};
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, Method, Request, Response};
use http_body_util::BodyExt;
use hyper::body::Body as _;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::MakeSpan,
};

static X_REQUEST_ID: &str = "x-request-id";

/// Puts the request id set by [`tower_http::request_id`] on the request span.
#[derive(Clone)]
pub(crate) struct MakeRequestIdSpan;

impl<B> MakeSpan<B> for MakeRequestIdSpan {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|id| id.to_str().ok())
            .unwrap_or("unknown");
        tracing::info_span!(
            "request",
            request_id = request_id,
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}

/// The maximum size of a body to log.
const MAX_BODY_SIZE: u64 = 8192;

/// Trace small request and response bodies.
pub(crate) async fn log_request_response(
    req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, body) = req.into_parts();
    let req = if fits(&body) {
        let bytes = buffer_and_print("Request", body).await?;
        Request::from_parts(parts, Body::from(bytes))
    } else {
        Request::from_parts(parts, body)
    };

    let res = next.run(req).await;

    let (parts, body) = res.into_parts();
    let res = if fits(&body) {
        let bytes = buffer_and_print("Response", body).await?;
        Response::from_parts(parts, Body::from(bytes))
    } else {
        Response::from_parts(parts, body)
    };

    Ok(res)
}

fn fits(body: &Body) -> bool {
    matches!(body.size_hint().upper(), Some(n) if n <= MAX_BODY_SIZE)
}

/// Read the entire body stream and store it in memory.
async fn buffer_and_print(direction: &str, body: Body) -> Result<Bytes, ApiError> {
    let body = body
        .collect()
        .await
        .map_err(|e| InternalError::Other(format!("failed to read {direction} body: {e}")))?
        .to_bytes();

    if let Ok(body) = std::str::from_utf8(&body) {
        tracing::trace!("{} body = {:?}", direction, body);
    }

    Ok(body)
}

/// Builds the CORS layer, if enabled.
///
/// Origins that are not valid header values are skipped with a warning.
pub(crate) fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }
    let origins = if config.allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(origin) => Some(origin),
                Err(e) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };
    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));
    Some(layer)
}
