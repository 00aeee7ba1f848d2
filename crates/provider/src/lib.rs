//! # Provider
//!
//! Patch distribution core.
//!
//! Responsibilities:
//! - Own the upstream source and drive its lifecycle
//! - Decode and validate every raw update against the local cluster
//! - Route valid requests to the subscriber registered for their kind
//! - Isolate per-entry failures; only construction and lifecycle errors
//!   reach the caller
//! - Drain delivery queues into consumers ([`ConsumerHandle`])

pub mod consumers;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod processor;
pub mod provider;
pub mod registry;

pub use contracts::{BatchSummary, ClusterIdentity, PatchRequest, TargetKind, UpdateSource};
pub use consumers::{JsonlConsumer, LogConsumer};
pub use error::ProviderError;
pub use handle::{ConsumerHandle, ConsumerStats};
pub use metrics::ProviderMetrics;
pub use processor::UpdateProcessor;
pub use provider::{
    always_leader, LeadershipQuery, PatchProvider, PatchProviderBuilder, ProviderConfig,
    ProviderState,
};
pub use registry::{DeliveryOutcome, SubscriberRegistry, DEFAULT_QUEUE_CAPACITY};
