/// Postal document handlers.
pub mod documents;
/// Health probe handler.
pub mod health;
/// Prometheus metrics exposition handler.
pub mod metrics;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::error::PostalError;

/// Wrapper that converts `PostalError` into an HTTP response.
pub struct ApiError(pub PostalError);

impl From<PostalError> for ApiError {
    fn from(e: PostalError) -> Self {
        ApiError(e)
    }
}

/// Maps `ApiError` to an HTTP response with a JSON body and appropriate status code.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status_code.is_server_error() {
            tracing::error!(error = %self.0, status, "server error");
        } else if status_code.is_client_error() {
            tracing::warn!(error = %self.0, status, "client error");
        }
        let body = json!({
            "error": self.0.to_string(),
            "status": status,
        });
        (status_code, axum::Json(body)).into_response()
    }
}

/// JSON body indented with two spaces.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec_pretty(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => ApiError(PostalError::Json(e)).into_response(),
        }
    }
}
