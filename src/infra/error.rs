//! Types for reporting errors that happened during a request.
//!
//! If your function interacts with the database or validates user input,
//! you likely want to return a [`ApiResult`].

use super::extract::Json;
use axum::{
    extract::rejection::{BytesRejection, PathRejection},
    response::IntoResponse,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::ResponseForPanic;
use utoipa::ToSchema;

/// A standard error response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// A description of the error.
    #[schema(example = "title is required")]
    error: String,
}

impl ErrorBody {
    pub(crate) fn new(error: String) -> Self {
        Self { error }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        self.error.as_ref()
    }
}

/// An error from our API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error caused by the client.
    #[error("{0}")]
    ClientError(#[from] ClientError),
    /// An internal error.
    #[error("{0}")]
    InternalError(#[from] InternalError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::ClientError(e) => e.into_response(),
            ApiError::InternalError(e) => {
                tracing::error!("internal error: {}", e);
                e.into_response()
            }
        }
    }
}

/// The result of calling API-related functions.
pub type ApiResult<T> = Result<T, ApiError>;

/// Every store failure is internal, constraint violations included.
impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::InternalError(InternalError::Store(e))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = e
            .field_errors()
            .into_keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort_unstable();
        ApiError::ClientError(ClientError::BadRequest(format!(
            "{} is required",
            fields.join(", ")
        )))
    }
}

/// Errors caused by the client.
/// The client can do something to fix these.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input validation failed.
    #[error("{0}")]
    BadRequest(String),
    /// The resource was not found.
    #[error("Not found")]
    NotFound,
    /// Custom error.
    #[error("{1}")]
    Custom(StatusCode, String),
}

/// A typed path that does not match means nothing was found.
impl Default for ClientError {
    fn default() -> Self {
        Self::NotFound
    }
}

/// Bodies are parsed as JSON whatever their declared content type.
impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        ClientError::BadRequest(format!("Invalid JSON body: {value}"))
    }
}

impl From<BytesRejection> for ClientError {
    fn from(value: BytesRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl From<PathRejection> for ClientError {
    fn from(value: PathRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> axum::response::Response {
        let msg = self.to_string();
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Custom(status, _) => status,
        };
        (status, Json(ErrorBody::new(msg))).into_response()
    }
}

/// An internal error.
/// The message is passed on to the client verbatim.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    /// The store failed to execute a statement.
    #[error("{0}")]
    Store(#[from] sqlx::Error),
    /// The store accepted a write but does not agree with itself afterwards.
    #[error("{0}")]
    Inconsistent(String),
    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl IntoResponse for InternalError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(self.to_string())),
        )
            .into_response()
    }
}

/// A handler for converting panics into proper responses for the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanicHandler;

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        _: Box<dyn std::any::Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        ApiError::InternalError(InternalError::Other("Panic".to_string())).into_response()
    }
}
