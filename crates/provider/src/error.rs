//! Provider error types

use thiserror::Error;

use crate::provider::ProviderState;

/// Provider-specific errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Source handle missing or not ready at construction
    #[error("provider initialization failed: {message}")]
    Initialization { message: String },

    /// Lifecycle call made in the wrong state
    #[error("invalid provider state: expected {expected}, found {actual}")]
    InvalidState {
        expected: ProviderState,
        actual: ProviderState,
    },

    /// Upstream source failed (from contract)
    #[error("upstream source error: {0}")]
    Source(#[from] contracts::ContractError),
}

impl ProviderError {
    /// Create an initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }
}
