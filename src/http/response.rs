//! Request-time errors and their HTTP rendering.
//!
//! # Responsibilities
//! - Carry parameter validation failures with an HTTP-style code
//! - Let controllers and middlewares fail with an explicit status
//! - Render every failure as a JSON error body
//!
//! # Design Decisions
//! - 4xx failures log at warn, 5xx at error
//! - Unknown codes fall back to 500 rather than panicking

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// A request value failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationData {
    /// HTTP-style status code, 400 unless the failing cast said otherwise.
    pub code: u16,
    pub message: String,
}

impl ValidationData {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Failure forwarded to the dispatcher's error pipeline.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Validation(#[from] ValidationData),

    /// A controller tried to set an invalid status code.
    #[error("\"{0}\" is not a valid HTTP response code")]
    InvalidStatus(u16),

    /// The request body is not valid JSON or exceeds the size limit.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Controller or middleware failure with an explicit status.
    #[error("{message}")]
    Http { status: StatusCode, message: String },
}

impl RouteError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        RouteError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Validation(v) => v.status(),
            RouteError::InvalidStatus(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouteError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RouteError::Http { status, .. } => *status,
        }
    }

    /// Short kind name used in the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::Validation(_) => "ValidationData",
            RouteError::InvalidStatus(_) => "InvalidArgument",
            RouteError::InvalidBody(_) => "InvalidBody",
            RouteError::Http { .. } => "HttpError",
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        let body = json!({
            "code": status.as_u16(),
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
