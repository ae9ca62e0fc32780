//! Settings loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::Settings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings, SettingsError> {
    let settings: Settings = toml::from_str(content)?;
    validate_settings(&settings).map_err(SettingsError::Validation)?;
    Ok(settings)
}
