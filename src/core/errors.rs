// src/core/errors.rs

//! Defines the primary error type for the bootstrap pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the bootstrap can surface to the operator.
///
/// The first group are configuration errors, raised before the store is
/// touched. The rest are fatal I/O or hashing failures.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context} '{}': {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize user store: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

impl BootstrapError {
    /// Wraps an `std::io::Error` together with the path it was raised for.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BootstrapError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors caused by operator input, which are reported
    /// together with the usage text.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            BootstrapError::MissingField { .. }
                | BootstrapError::InvalidField { .. }
                | BootstrapError::Config(_)
        )
    }
}
