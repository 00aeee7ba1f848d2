//! Upstream source error types

use contracts::ContractError;
use thiserror::Error;

/// Upstream source errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Source has not been started (or was closed)
    #[error("source {source_name} is not running")]
    NotRunning {
        /// Source name
        source_name: String,
    },

    /// Source was started twice
    #[error("source {source_name} is already running")]
    AlreadyRunning {
        /// Source name
        source_name: String,
    },

    /// Consumer side of the update channel is gone
    #[error("update channel closed for source {source_name}")]
    ChannelClosed {
        /// Source name
        source_name: String,
    },

    /// Watched directory does not exist
    #[error("directory not found: {path}")]
    DirectoryNotFound {
        /// Directory path
        path: String,
    },

    /// Failed to spawn the polling thread
    #[error("failed to spawn poller for {source_name}: {source}")]
    Spawn {
        /// Source name
        source_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<UpstreamError> for ContractError {
    fn from(err: UpstreamError) -> Self {
        let source_name = match &err {
            UpstreamError::NotRunning { source_name }
            | UpstreamError::AlreadyRunning { source_name }
            | UpstreamError::ChannelClosed { source_name }
            | UpstreamError::Spawn { source_name, .. } => source_name.clone(),
            UpstreamError::DirectoryNotFound { path } => path.clone(),
        };
        ContractError::source_unavailable(source_name, err.to_string())
    }
}

/// Upstream Result type alias
pub type Result<T> = std::result::Result<T, UpstreamError>;
