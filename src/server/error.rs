use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{error::ContentError, types::RepositoryCoordinates};

/// Error returned by the HTTP handlers, rendered as `{statusCode, message}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    status_code: u16,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    /// Map a fetch failure, restating the requested resource on not-found
    pub fn from_fetch_error(error: ContentError, coordinates: &RepositoryCoordinates) -> Self {
        match error {
            ContentError::NotFound { path } => {
                tracing::debug!(missing = %path, "Remote content not found");
                Self::not_found(not_found_message(coordinates))
            }
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn not_found_message(coordinates: &RepositoryCoordinates) -> String {
    let mut message = format!(
        "Path '{}' wasn't found in {}/{}",
        coordinates.path().unwrap_or("/"),
        coordinates.owner,
        coordinates.repository
    );
    if let Some(reference) = coordinates.ref_name() {
        message.push_str(&format!(" with ref = {}", reference));
    }
    message
}

impl From<ContentError> for ApiError {
    fn from(error: ContentError) -> Self {
        match error {
            ContentError::Validation { .. } => Self::bad_request(error.to_string()),
            ContentError::NotFound { path } => {
                Self::not_found(format!("Path '{}' wasn't found", path))
            }
            ContentError::RateLimited { message } => {
                tracing::warn!(%message, "Upstream rate limit hit");
                Self::new(StatusCode::BAD_GATEWAY, "Upstream rate limit exceeded")
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                Self::internal()
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("ValidationError: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
