//! Mapping from engine errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use api::ErrorBody;

use crate::fs::FsError;

/// Client-facing failure of an API call.
///
/// Every variant carries the message that ends up in the JSON error body.
/// Engine errors convert via [`From<FsError>`]; handlers construct the
/// variants directly for request-shape problems the engine never sees
/// (missing fields, empty uploads).
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is unacceptable.
    BadRequest(String),
    /// The addressed entry does not exist or has the wrong kind.
    NotFound(String),
    /// The operation collides with an existing entry.
    Conflict(String),
    /// The daemon failed; details go to the log, the message to the client.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl From<FsError> for ApiError {
    fn from(err: FsError) -> Self {
        let message = err.to_string();
        match err {
            FsError::InvalidPath | FsError::SelfMove(_) | FsError::AlreadyThere(_) => {
                ApiError::BadRequest(message)
            }
            FsError::NotFound(_) | FsError::NotADirectory(_) | FsError::IsADirectory(_) => {
                ApiError::NotFound(message)
            }
            FsError::Conflict(_) => ApiError::Conflict(message),
            FsError::Io(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, message = %self.message(), "request failed");
        }
        (status, Json(ErrorBody::new(self.message()))).into_response()
    }
}
