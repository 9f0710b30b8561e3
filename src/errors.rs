// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::dag::ValidationResult;

#[derive(Error, Debug)]
pub enum DagrunError {
    /// The task graph failed structural validation. No task was executed.
    #[error("Workflow validation failed: {message}")]
    Validation {
        message: String,
        result: ValidationResult,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagrunError {
    /// Wrap a failed [`ValidationResult`], joining every error message.
    pub fn validation(result: ValidationResult) -> Self {
        let message = result
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        DagrunError::Validation { message, result }
    }

    /// Structured validation result, if this is a validation error.
    pub fn validation_result(&self) -> Option<&ValidationResult> {
        match self {
            DagrunError::Validation { result, .. } => Some(result),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagrunError>;
