//! ServiceSettings - Config Loader output
//!
//! Describes the full service setup: cluster identity, provider tuning,
//! upstream source and subscribers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{ClusterIdentity, TargetKind};

/// Settings version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete service settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceSettings {
    /// Settings version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Local cluster identity
    #[validate(nested)]
    pub cluster: ClusterIdentity,

    /// Provider tuning
    #[serde(default)]
    #[validate(nested)]
    pub provider: ProviderSettings,

    /// Upstream source
    pub source: SourceSettings,

    /// Consumers to attach
    #[serde(default)]
    pub subscribers: Vec<SubscriberSettings>,
}

/// Provider tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProviderSettings {
    /// Capacity of each delivery queue
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, max = 10_000))]
    pub queue_capacity: usize,

    /// Batches buffered between source and processor
    #[serde(default = "default_update_buffer")]
    #[validate(range(min = 1, max = 10_000))]
    pub update_buffer: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            update_buffer: default_update_buffer(),
        }
    }
}

fn default_queue_capacity() -> usize {
    10
}

fn default_update_buffer() -> usize {
    16
}

/// Upstream source selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSettings {
    /// Poll a directory of JSON payloads
    Directory {
        path: PathBuf,
        #[serde(default = "default_poll_interval_ms")]
        poll_interval_ms: u64,
    },
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// One consumer attached to a target kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberSettings {
    /// Kind to subscribe to
    pub kind: TargetKind,

    /// Where received requests go
    #[serde(default)]
    pub output: OutputType,

    /// Output file (required for `jsonl`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Consumer output type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// Log each request
    #[default]
    Log,
    /// Append each request as a JSON line
    Jsonl,
}
