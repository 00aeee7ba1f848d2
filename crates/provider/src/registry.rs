//! SubscriberRegistry - one bounded delivery queue per target kind

use std::collections::HashMap;

use contracts::{PatchRequest, TargetKind};
use observability::record_queue_depth;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Queue capacity used when none is configured
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Result of routing one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Request is in the subscriber's queue
    Delivered,
    /// Nobody subscribed to the kind; request dropped
    NoSubscriber,
    /// Subscriber dropped its receiver; request dropped
    ConsumerGone,
}

/// Maps a target kind to the sending half of its delivery queue.
///
/// At most one queue exists per kind. Subscribing again replaces the
/// previous queue; there is no unsubscribe.
pub struct SubscriberRegistry {
    queues: RwLock<HashMap<TargetKind, mpsc::Sender<PatchRequest>>>,
    capacity: usize,
}

impl SubscriberRegistry {
    /// Create an empty registry whose queues hold `capacity` requests
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Capacity of every delivery queue
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a new queue for `kind`, replacing any previous one
    pub fn subscribe(&self, kind: TargetKind) -> mpsc::Receiver<PatchRequest> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let replaced = self.queues.write().insert(kind.clone(), tx).is_some();
        if replaced {
            info!(kind = %kind, "Replaced existing subscription");
        } else {
            debug!(kind = %kind, capacity = self.capacity, "Registered subscription");
        }
        rx
    }

    /// Sender for `kind`, if subscribed
    pub fn sender(&self, kind: &TargetKind) -> Option<mpsc::Sender<PatchRequest>> {
        self.queues.read().get(kind).cloned()
    }

    /// Route a request to its kind's queue
    ///
    /// Waits while the queue is full. The registry lock is not held while
    /// waiting, so `subscribe` stays available.
    pub async fn deliver(&self, request: PatchRequest) -> DeliveryOutcome {
        let kind = request.kind().clone();
        let Some(tx) = self.sender(&kind) else {
            return DeliveryOutcome::NoSubscriber;
        };

        match tx.send(request).await {
            Ok(()) => {
                record_queue_depth(&kind, self.capacity - tx.capacity());
                DeliveryOutcome::Delivered
            }
            Err(mpsc::error::SendError(req)) => {
                warn!(
                    kind = %kind,
                    id = %req.id,
                    "Subscriber queue closed, patch request dropped"
                );
                DeliveryOutcome::ConsumerGone
            }
        }
    }

    /// Kinds with a registered queue
    pub fn kinds(&self) -> Vec<TargetKind> {
        self.queues.read().keys().cloned().collect()
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.queues.read().len()
    }

    /// Whether no kind is registered
    pub fn is_empty(&self) -> bool {
        self.queues.read().is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
