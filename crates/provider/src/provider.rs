//! PatchProvider - lifecycle of the distribution loop
//!
//! `Created -> Running -> Stopped`, no way back. Batches from the upstream
//! source are consumed on the task that called [`PatchProvider::start`]
//! until the cancellation token fires. Cancellation also interrupts a batch
//! stalled on a full delivery queue.

use std::fmt;
use std::sync::Arc;

use contracts::{update_channel, ClusterIdentity, PatchRequest, TargetKind, UpdateReceiver, UpdateSource};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::metrics::ProviderMetrics;
use crate::processor::UpdateProcessor;
use crate::registry::{SubscriberRegistry, DEFAULT_QUEUE_CAPACITY};

/// Zero-argument predicate telling whether this process is the active leader
pub type LeadershipQuery = Arc<dyn Fn() -> bool + Send + Sync>;

/// Leadership query for single-replica deployments
pub fn always_leader() -> LeadershipQuery {
    Arc::new(|| true)
}

/// Provider lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Provider tuning
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Capacity of each subscriber's delivery queue
    pub queue_capacity: usize,
    /// Batches the source may queue ahead of the processor
    pub update_buffer: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            update_buffer: 16,
        }
    }
}

/// Builder for creating a PatchProvider
pub struct PatchProviderBuilder {
    cluster: ClusterIdentity,
    source: Option<Arc<dyn UpdateSource>>,
    is_leader: LeadershipQuery,
    config: ProviderConfig,
}

impl PatchProviderBuilder {
    /// Start a builder for `cluster`
    pub fn new(cluster: ClusterIdentity) -> Self {
        Self {
            cluster,
            source: None,
            is_leader: always_leader(),
            config: ProviderConfig::default(),
        }
    }

    /// Upstream source to consume
    pub fn source(mut self, source: Arc<dyn UpdateSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Leadership query stored on the provider
    pub fn leadership(mut self, is_leader: LeadershipQuery) -> Self {
        self.is_leader = is_leader;
        self
    }

    /// Provider tuning
    pub fn config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the provider
    ///
    /// # Errors
    /// [`ProviderError::Initialization`] if no source was given or the
    /// source is not ready.
    #[instrument(name = "patch_provider_build", skip(self), fields(cluster = %self.cluster.name))]
    pub fn build(self) -> Result<PatchProvider, ProviderError> {
        let source = self
            .source
            .ok_or_else(|| ProviderError::initialization("upstream source not initialized"))?;
        if !source.is_ready() {
            return Err(ProviderError::initialization(format!(
                "upstream source '{}' is not ready",
                source.name()
            )));
        }

        let registry = Arc::new(SubscriberRegistry::new(self.config.queue_capacity));
        let metrics = Arc::new(ProviderMetrics::new());
        let processor = UpdateProcessor::new(self.cluster, registry, metrics);

        debug!(source = %source.name(), "Patch provider created");
        Ok(PatchProvider {
            source,
            is_leader: self.is_leader,
            processor,
            state: Mutex::new(ProviderState::Created),
            update_buffer: self.config.update_buffer,
        })
    }
}

/// Consumes patch configs from the upstream source and delivers them to
/// the subscriber of each target kind.
pub struct PatchProvider {
    source: Arc<dyn UpdateSource>,
    is_leader: LeadershipQuery,
    processor: UpdateProcessor,
    state: Mutex<ProviderState>,
    update_buffer: usize,
}

impl PatchProvider {
    /// Create a provider with default tuning
    ///
    /// # Errors
    /// [`ProviderError::Initialization`] if `source` is `None` or not ready.
    pub fn new(
        source: Option<Arc<dyn UpdateSource>>,
        is_leader: LeadershipQuery,
        cluster: ClusterIdentity,
    ) -> Result<Self, ProviderError> {
        let mut builder = PatchProviderBuilder::new(cluster).leadership(is_leader);
        if let Some(source) = source {
            builder = builder.source(source);
        }
        builder.build()
    }

    /// Register (or replace) the delivery queue for `kind`
    ///
    /// Subscribe before [`start`](Self::start) to see every update; a later
    /// subscription only sees updates processed after it.
    pub fn subscribe(&self, kind: impl Into<TargetKind>) -> mpsc::Receiver<PatchRequest> {
        self.processor.registry().subscribe(kind.into())
    }

    /// Run until `cancel` fires
    ///
    /// Hands the update channel to the source, starts it, processes batches,
    /// then closes the source once cancellation is signalled.
    ///
    /// # Errors
    /// - [`ProviderError::InvalidState`] unless the provider is `Created`
    /// - [`ProviderError::Source`] if the source fails to start
    #[instrument(name = "patch_provider_start", skip(self, cancel), fields(source = %self.source.name()))]
    pub async fn start(&self, cancel: CancellationToken) -> Result<(), ProviderError> {
        self.transition(ProviderState::Created, ProviderState::Running)?;
        info!(
            cluster = %self.processor.cluster().name,
            subscriptions = self.processor.registry().len(),
            "Starting patch provider"
        );

        let (tx, rx) = update_channel(self.update_buffer);
        if let Err(e) = self.source.start(tx) {
            error!(error = %e, "Failed to start upstream source");
            self.stop().await;
            return Err(e.into());
        }

        self.run(rx, &cancel).await;

        info!("Shutting down patch provider");
        self.stop().await;
        Ok(())
    }

    async fn run(&self, rx: UpdateReceiver, cancel: &CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(batch) => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                warn!("Cancelled while a batch was in flight, remaining entries dropped");
                                break;
                            }
                            _ = self.processor.process(batch) => {}
                        }
                    }
                    Err(_) => {
                        warn!("Upstream source closed its update stream, waiting for cancellation");
                        cancel.cancelled().await;
                        break;
                    }
                },
            }
        }
    }

    async fn stop(&self) {
        // Sources may join a thread on close; keep that off the async workers.
        let source = Arc::clone(&self.source);
        if let Err(e) = tokio::task::spawn_blocking(move || source.close()).await {
            error!(error = ?e, "Upstream source close panicked");
        }
        *self.state.lock() = ProviderState::Stopped;
        info!(
            batches = self.processor.metrics().batch_count(),
            delivered = self.processor.metrics().delivered_count(),
            "Patch provider stopped"
        );
    }

    fn transition(&self, from: ProviderState, to: ProviderState) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(ProviderError::InvalidState {
                expected: from,
                actual: *state,
            });
        }
        *state = to;
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProviderState {
        *self.state.lock()
    }

    /// Ask the stored leadership query
    pub fn is_leader(&self) -> bool {
        (self.is_leader)()
    }

    /// Kinds with a registered subscriber
    pub fn subscribed_kinds(&self) -> Vec<TargetKind> {
        self.processor.registry().kinds()
    }

    /// Cluster requests are validated against
    pub fn cluster(&self) -> &ClusterIdentity {
        self.processor.cluster()
    }

    /// Running totals
    pub fn metrics(&self) -> &Arc<ProviderMetrics> {
        self.processor.metrics()
    }
}
