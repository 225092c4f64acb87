//! Menu document loading.
//!
//! Text is decoded with `serde_yaml` into an untyped [`RawValue`], then handed
//! to the validator. Partially decoded documents are never validated: a
//! syntax error stops the load with its line and column.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::model::MenuConfiguration;
use super::validator::{validate, RawValue, ValidationErrors};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{}", describe_decode(.message, .line, .column))]
    Decode {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
    #[error("Invalid menu configuration: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("YAML encode error: {0}")]
    Encode(#[source] serde_yaml::Error),
    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),
}

fn describe_decode(message: &str, line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => {
            format!("YAML syntax error at line {}, column {}: {}", line, column, message)
        }
        _ => format!("YAML syntax error: {}", message),
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        let location = err.location();
        ConfigError::Decode {
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }
}

/// Decode document text into an untyped value tree
pub fn decode(text: &str) -> Result<RawValue, ConfigError> {
    // Empty documents are reported by the validator, not the decoder.
    if text.trim().is_empty() {
        return Ok(RawValue::Null);
    }
    Ok(serde_yaml::from_str::<RawValue>(text)?)
}

/// Decode and validate a menu document
pub fn parse_config(text: &str) -> Result<MenuConfiguration, ConfigError> {
    let raw = decode(text)?;
    let config = validate(&raw).into_config()?;
    Ok(config)
}

/// Load and validate a menu document from disk
pub fn load_config(path: &Path) -> Result<MenuConfiguration, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(
        path = %path.display(),
        nodes = config.node_count(),
        commands = config.commands.len(),
        "Loaded menu configuration"
    );
    Ok(config)
}

/// Serialize a configuration back into document form
pub fn to_yaml(config: &MenuConfiguration) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(ConfigError::Encode)
}
