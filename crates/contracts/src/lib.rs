//! # Contracts
//!
//! Shared data structures and traits for the patch distribution pipeline.
//! Every other crate in the workspace depends on this one; it depends on none of them.
//!
//! ## Flow
//! - An [`UpdateSource`] pushes [`UpdateBatch`] messages into an [`UpdateSender`]
//! - Each [`RawUpdate`] payload decodes into a [`PatchRequest`]
//! - A request is routable only after [`PatchRequest::validate`] accepts it
//!   for the local [`ClusterIdentity`]

mod cluster;
mod consumer;
mod error;
mod patch;
mod settings;
mod summary;
mod target_kind;
mod update;
mod update_source;

pub use cluster::ClusterIdentity;
pub use consumer::{LocalPatchConsumer, PatchConsumer};
pub use error::*;
pub use patch::*;
pub use settings::*;
pub use summary::BatchSummary;
pub use target_kind::TargetKind;
pub use update::*;
pub use update_source::{update_channel, UpdateReceiver, UpdateSender, UpdateSource};
