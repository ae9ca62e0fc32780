//! Configuration schema definitions.
//!
//! This module defines the settings structure for the route compiler and the
//! HTTP server it feeds. All types derive Serde traits for deserialization
//! from a TOML settings file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Route compiler settings.
    pub parser: ParserConfig,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Route compiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Directory route configuration files (and imports) are resolved against.
    pub config_dir: PathBuf,

    /// Base directory for controller names.
    pub controller_dir: PathBuf,

    /// Base directory for middleware names.
    pub middleware_dir: PathBuf,

    /// Status used when a method declares no `response_code`.
    pub http_default_response_code: u16,

    /// Status codes a method may declare.
    pub http_responses_code: Vec<u16>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            controller_dir: PathBuf::from("controller"),
            middleware_dir: PathBuf::from("middleware"),
            http_default_response_code: 200,
            http_responses_code: vec![200, 201, 202, 203, 204, 205, 206, 418],
        }
    }
}

impl ParserConfig {
    pub fn allows(&self, code: u16) -> bool {
        self.http_responses_code.contains(&code)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum buffered request body size.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
