//! In-memory update source
//!
//! Batches are pushed by whoever holds an [`UpdatePublisher`]. Useful for
//! embedding the provider behind another transport, and for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{ContractError, UpdateBatch, UpdateSender, UpdateSource};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{Result, UpstreamError};

struct Shared {
    name: String,
    sender: Mutex<Option<UpdateSender>>,
    running: AtomicBool,
}

impl Shared {
    fn sender(&self) -> Result<UpdateSender> {
        self.sender
            .lock()
            .clone()
            .ok_or_else(|| UpstreamError::NotRunning {
                source_name: self.name.clone(),
            })
    }

    fn closed(&self) -> UpstreamError {
        UpstreamError::ChannelClosed {
            source_name: self.name.clone(),
        }
    }
}

/// Update source fed through an [`UpdatePublisher`]
pub struct ChannelSource {
    shared: Arc<Shared>,
}

impl ChannelSource {
    /// Create a source and the publisher that feeds it
    pub fn new(name: impl Into<String>) -> (Self, UpdatePublisher) {
        let shared = Arc::new(Shared {
            name: name.into(),
            sender: Mutex::new(None),
            running: AtomicBool::new(false),
        });
        let publisher = UpdatePublisher {
            shared: Arc::clone(&shared),
        };
        (Self { shared }, publisher)
    }

    /// Another publisher for the same source
    pub fn publisher(&self) -> UpdatePublisher {
        UpdatePublisher {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl UpdateSource for ChannelSource {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn start(&self, updates: UpdateSender) -> std::result::Result<(), ContractError> {
        let mut sender = self.shared.sender.lock();
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(UpstreamError::AlreadyRunning {
                source_name: self.shared.name.clone(),
            }
            .into());
        }
        *sender = Some(updates);
        info!(source = %self.shared.name, "channel source started");
        Ok(())
    }

    fn close(&self) {
        let mut sender = self.shared.sender.lock();
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = sender.take() {
            tx.close();
        }
        info!(source = %self.shared.name, "channel source closed");
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

/// Handle used to push batches into a running [`ChannelSource`]
#[derive(Clone)]
pub struct UpdatePublisher {
    shared: Arc<Shared>,
}

impl UpdatePublisher {
    /// Push a batch, waiting while the update channel is full
    ///
    /// # Errors
    /// Fails if the source is not running or its channel was closed.
    pub async fn publish(&self, batch: UpdateBatch) -> Result<()> {
        let tx = self.shared.sender()?;
        let entries = batch.len();
        tx.send(batch).await.map_err(|_| self.shared.closed())?;
        debug!(source = %self.shared.name, entries, "batch published");
        Ok(())
    }

    /// Blocking variant of [`publish`](Self::publish) for non-async producers
    pub fn publish_blocking(&self, batch: UpdateBatch) -> Result<()> {
        let tx = self.shared.sender()?;
        tx.send_blocking(batch).map_err(|_| self.shared.closed())
    }

    /// Whether the source currently accepts batches
    pub fn is_open(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}
