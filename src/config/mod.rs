//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → ParserConfig to the tree compiler, ServerConfig to the HTTP server
//! ```
//!
//! Route configuration (YAML) is a separate document handled by
//! [`crate::parser::Parser`]; these settings only say where to find it and
//! how to compile it.
//!
//! # Design Decisions
//! - Settings are immutable once loaded
//! - All fields have defaults to allow minimal (or no) settings files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, SettingsError};
pub use schema::{LoggingConfig, ParserConfig, ServerConfig, Settings};
pub use validation::{validate_settings, ValidationError};
