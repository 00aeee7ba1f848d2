//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Settings file not found
    #[error("Settings file not found: {path}")]
    ConfigNotFound { path: String },

    /// Payload file not found
    #[error("Payload file not found: {path}")]
    PayloadNotFound { path: String },

    /// Consumer could not be created
    #[error("Failed to create consumer for kind '{kind}': {message}")]
    Consumer { kind: String, message: String },

    /// A worker task failed during shutdown
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn payload_not_found(path: impl Into<String>) -> Self {
        Self::PayloadNotFound { path: path.into() }
    }

    pub fn consumer(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Consumer {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
