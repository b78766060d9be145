//! CLI-facing error type.

use thiserror::Error;

/// Unified CLI error type.
#[derive(Error, Debug, Clone)]
pub enum CliError {
    /// A required argument was not supplied.
    #[error("missing required argument: {0}")]
    MissingArgument(String),
    /// Hex or address input failed validation.
    #[error("validation error for '{field}': {message}")]
    Validation { field: String, message: String },
    /// I/O failure reading the input file.
    #[error("I/O error: {0}")]
    Io(String),
    /// The decoder rejected the input.
    #[error("decode error: {0}")]
    Decode(String),
}

impl CliError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<etca_core::error::DecodeError> for CliError {
    fn from(err: etca_core::error::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
