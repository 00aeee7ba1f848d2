//! ConsumerHandle - drains one delivery queue into a consumer on its own task

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{PatchConsumer, PatchRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

/// Counters for one consumer
#[derive(Debug, Default)]
pub struct ConsumerStats {
    applied: AtomicU64,
    failures: AtomicU64,
}

impl ConsumerStats {
    /// Requests applied successfully
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Requests the consumer failed to apply
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Handle to a running consumer worker
pub struct ConsumerHandle {
    name: String,
    stats: Arc<ConsumerStats>,
    worker_handle: JoinHandle<()>,
}

impl ConsumerHandle {
    /// Spawn a worker feeding `queue` into `consumer`
    ///
    /// The worker ends once every sender of `queue` is gone, i.e. when the
    /// provider is dropped or the kind is subscribed again.
    pub fn spawn<C: PatchConsumer + 'static>(
        consumer: C,
        queue: mpsc::Receiver<PatchRequest>,
    ) -> Self {
        let name = consumer.name().to_string();
        let stats = Arc::new(ConsumerStats::default());

        let worker_stats = Arc::clone(&stats);
        let worker_name = name.clone();
        let worker_handle = tokio::spawn(async move {
            consumer_worker(consumer, queue, worker_stats, worker_name).await;
        });

        Self {
            name,
            stats,
            worker_handle,
        }
    }

    /// Consumer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live counters
    pub fn stats(&self) -> &Arc<ConsumerStats> {
        &self.stats
    }

    /// Wait for the worker to drain its queue and close the consumer
    #[instrument(name = "consumer_handle_join", skip(self), fields(consumer = %self.name))]
    pub async fn join(self) -> Arc<ConsumerStats> {
        if let Err(e) = self.worker_handle.await {
            error!(consumer = %self.name, error = ?e, "Consumer task panicked");
        }
        debug!(consumer = %self.name, "Consumer worker joined");
        self.stats
    }
}

#[instrument(name = "consumer_worker_loop", skip(consumer, queue, stats), fields(consumer = %name))]
async fn consumer_worker<C: PatchConsumer>(
    mut consumer: C,
    mut queue: mpsc::Receiver<PatchRequest>,
    stats: Arc<ConsumerStats>,
    name: String,
) {
    debug!(consumer = %name, "Consumer worker started");

    while let Some(request) = queue.recv().await {
        match consumer.apply(&request).await {
            Ok(()) => {
                stats.applied.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    consumer = %name,
                    id = %request.id,
                    target = %request.k8s_target,
                    error = %e,
                    "Apply failed"
                );
            }
        }
    }

    if let Err(e) = consumer.close().await {
        error!(consumer = %name, error = %e, "Close failed on shutdown");
    }
    debug!(consumer = %name, "Consumer worker stopped");
}
