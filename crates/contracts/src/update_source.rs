//! UpdateSource trait - upstream configuration source abstraction
//!
//! A source produces [`UpdateBatch`] messages on a bounded channel handed to
//! it at start time. This replaces a callback registration: the sender is the
//! "callback", and a full channel blocks the source the same way a slow
//! callback would.

use crate::{ContractError, UpdateBatch};

/// Sending half handed to a source on start
pub type UpdateSender = async_channel::Sender<UpdateBatch>;

/// Receiving half drained by the provider
pub type UpdateReceiver = async_channel::Receiver<UpdateBatch>;

/// Create a bounded update channel
pub fn update_channel(capacity: usize) -> (UpdateSender, UpdateReceiver) {
    async_channel::bounded(capacity.max(1))
}

/// Upstream configuration source
///
/// # Example
///
/// ```ignore
/// let (tx, rx) = contracts::update_channel(16);
/// source.start(tx)?;
/// while let Ok(batch) = rx.recv().await {
///     // decode, validate, route
/// }
/// source.close();
/// ```
pub trait UpdateSource: Send + Sync {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Whether the source can be started
    fn is_ready(&self) -> bool {
        true
    }

    /// Begin delivering batches into `updates`
    ///
    /// # Errors
    /// Returns an error if the source is already running or cannot start.
    fn start(&self, updates: UpdateSender) -> Result<(), ContractError>;

    /// Stop delivering batches
    ///
    /// Must be idempotent. After `close` returns no new batches are sent.
    fn close(&self);

    /// Check if the source is currently delivering
    fn is_running(&self) -> bool;
}
