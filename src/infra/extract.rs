//! Custom axum extractors.

use super::error::ClientError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    response::IntoResponse,
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

/// A custom JSON extractor since axum's does not let us customize the response.
///
/// The body is parsed as JSON regardless of its `content-type` header.
/// Rejections are reported as [`ClientError`]s, so they share the `{"error": ...}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> AsRef<T> for Json<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ClientError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        let value = serde_json::from_slice(&bytes)?;
        Ok(Json(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::extract::Json(self.0).into_response()
    }
}
