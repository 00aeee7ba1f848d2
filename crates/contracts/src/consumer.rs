//! PatchConsumer trait - the receiving end of a delivery queue
//!
//! Consumers apply validated patch requests to live targets. The provider
//! never calls them directly; a worker drains the queue into them.

use crate::{ContractError, PatchRequest};

/// Patch request consumer
///
/// All consumer implementations must implement this trait.
#[trait_variant::make(PatchConsumer: Send)]
pub trait LocalPatchConsumer {
    /// Consumer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Apply one patch request
    ///
    /// # Errors
    /// Returns an apply error (should include context)
    async fn apply(&mut self, request: &PatchRequest) -> Result<(), ContractError>;

    /// Release resources once the queue is drained
    async fn close(&mut self) -> Result<(), ContractError>;
}
