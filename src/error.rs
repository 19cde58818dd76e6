use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::MessageResponse, repository::RepositoryError};

/// ApiError
///
/// Every failure a handler or extractor can surface. Each variant maps to a status
/// code and a `{"message": ...}` body. Failures are terminal for the request; nothing
/// is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential was presented.
    #[error("Not authenticated")]
    AuthenticationMissing,

    /// The credential failed verification, or its role does not fit the route.
    #[error("{0}")]
    AuthenticationInvalid(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Store, network or programming failure. The detail is logged, never returned.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationMissing | ApiError::AuthenticationInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the caller.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Unexpected(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Unexpected(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        let body = MessageResponse {
            message: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => ApiError::Conflict(message),
            other => ApiError::Unexpected(other.to_string()),
        }
    }
}
