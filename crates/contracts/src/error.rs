//! Layered error definitions
//!
//! Categorized by source: config / payload / source

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Raw update payload could not be decoded into a patch request
    #[error("payload decode error for '{path}': {message}")]
    PayloadDecode {
        path: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Patch request is well-formed but not acceptable for this cluster
    #[error("invalid patch request at '{field}': {message}")]
    PatchValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Upstream source is not ready or no longer accepting work
    #[error("source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload decode error from a serde_json failure
    pub fn payload_decode(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::PayloadDecode {
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create patch validation error
    pub fn patch_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PatchValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source unavailable error
    pub fn source_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
