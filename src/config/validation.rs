//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the default response code is one of the allowed codes
//! - Validate value ranges (timeouts > 0, limits > 0, codes are HTTP statuses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - Runs before settings are handed to the parser or the server

use std::fmt;
use std::net::SocketAddr;

use axum::http::StatusCode;

use crate::config::schema::Settings;

/// A single semantic violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted settings key, e.g. `parser.http_responses_code`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let parser = &settings.parser;

    if parser.http_responses_code.is_empty() {
        errors.push(ValidationError::new(
            "parser.http_responses_code",
            "at least one response code must be allowed",
        ));
    }
    for code in &parser.http_responses_code {
        if StatusCode::from_u16(*code).is_err() {
            errors.push(ValidationError::new(
                "parser.http_responses_code",
                format!("{code} is not a valid HTTP status"),
            ));
        }
    }
    if !parser.allows(parser.http_default_response_code) {
        errors.push(ValidationError::new(
            "parser.http_default_response_code",
            format!(
                "{} is not in the allowed response codes",
                parser.http_default_response_code
            ),
        ));
    }

    let server = &settings.server;
    if server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("\"{}\" is not a socket address", server.bind_address),
        ));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if server.body_limit_bytes == 0 {
        errors.push(ValidationError::new(
            "server.body_limit_bytes",
            "must be greater than zero",
        ));
    }

    if settings.logging.level.trim().is_empty() {
        errors.push(ValidationError::new("logging.level", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
