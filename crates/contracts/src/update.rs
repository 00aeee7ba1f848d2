//! Raw updates as delivered by an upstream source.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One callback's worth of updates, keyed by an opaque config path.
///
/// Iteration order is unspecified.
pub type UpdateBatch = HashMap<String, RawUpdate>;

/// Serialized payload plus delivery metadata
#[derive(Debug, Clone)]
pub struct RawUpdate {
    /// Serialized patch request (JSON)
    pub config: Bytes,

    /// Where the payload came from
    pub metadata: UpdateMetadata,
}

impl RawUpdate {
    /// Create a raw update, deriving `raw_length` from the payload
    pub fn new(config: impl Into<Bytes>, mut metadata: UpdateMetadata) -> Self {
        let config = config.into();
        metadata.raw_length = config.len() as u64;
        Self { config, metadata }
    }
}

/// Delivery metadata attached by the source
#[derive(Debug, Clone)]
pub struct UpdateMetadata {
    /// Product the config belongs to (e.g. `APM_TRACING`)
    pub product: String,

    /// Config identifier within the product
    pub id: String,

    /// Human readable name
    pub name: String,

    /// Version of this config at the source
    pub version: u64,

    /// Payload length in bytes
    pub raw_length: u64,

    /// When the source observed the update
    pub received_at: DateTime<Utc>,
}

impl UpdateMetadata {
    /// Product name used for tracer configuration updates
    pub const APM_TRACING: &'static str = "APM_TRACING";

    /// Metadata for an `APM_TRACING` config
    pub fn apm_tracing(id: impl Into<String>, version: u64) -> Self {
        let id = id.into();
        Self {
            product: Self::APM_TRACING.to_string(),
            name: id.clone(),
            id,
            version,
            raw_length: 0,
            received_at: Utc::now(),
        }
    }
}
