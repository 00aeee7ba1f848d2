//! UpdateProcessor - decode, validate and route one raw update batch

use std::sync::Arc;
use std::time::Instant;

use contracts::{BatchSummary, ClusterIdentity, ContractError, PatchRequest, RawUpdate, UpdateBatch};
use observability::{record_patch_rejected, RejectReason};
use tracing::{debug, error, info, instrument};

use crate::metrics::ProviderMetrics;
use crate::registry::{DeliveryOutcome, SubscriberRegistry};

/// Turns raw update batches into deliveries.
///
/// Entries are handled one after another. A failure on one entry is logged
/// and skipped; it never stops the rest of the batch.
pub struct UpdateProcessor {
    cluster: ClusterIdentity,
    registry: Arc<SubscriberRegistry>,
    metrics: Arc<ProviderMetrics>,
}

impl UpdateProcessor {
    /// Create a processor routing into `registry`
    pub fn new(
        cluster: ClusterIdentity,
        registry: Arc<SubscriberRegistry>,
        metrics: Arc<ProviderMetrics>,
    ) -> Self {
        Self {
            cluster,
            registry,
            metrics,
        }
    }

    /// Cluster requests are validated against
    pub fn cluster(&self) -> &ClusterIdentity {
        &self.cluster
    }

    /// Registry requests are routed into
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Metrics updated after every batch
    pub fn metrics(&self) -> &Arc<ProviderMetrics> {
        &self.metrics
    }

    /// Process every entry of `batch`
    ///
    /// May wait on a full subscriber queue; entries behind it wait too.
    #[instrument(name = "update_processor_process", skip_all, fields(entries = batch.len()))]
    pub async fn process(&self, batch: UpdateBatch) -> BatchSummary {
        info!(entries = batch.len(), "Got updates from upstream source");
        let started = Instant::now();
        let mut summary = BatchSummary {
            received: batch.len(),
            ..Default::default()
        };

        for (path, update) in batch {
            self.process_entry(&path, update, &mut summary).await;
        }

        summary.duration = started.elapsed();
        self.metrics.observe(&summary);
        summary
    }

    async fn process_entry(&self, path: &str, update: RawUpdate, summary: &mut BatchSummary) {
        debug!(
            path = %path,
            product = %update.metadata.product,
            config_id = %update.metadata.id,
            version = update.metadata.version,
            raw_length = update.metadata.raw_length,
            "Parsing config"
        );

        let request = match PatchRequest::decode(path, &update.config) {
            Ok(request) => request,
            Err(e) => {
                error!(path = %path, error = %e, "Error while parsing config");
                summary.decode_failures += 1;
                record_patch_rejected(RejectReason::Decode);
                return;
            }
        };
        debug!(path = %path, id = %request.id, target = %request.k8s_target, "Patch request parsed");

        if let Err(e) = self.validate(&request) {
            error!(path = %path, id = %request.id, error = %e, "Skipping invalid patch request");
            summary.validation_failures += 1;
            record_patch_rejected(RejectReason::Validation);
            return;
        }

        let kind = request.kind().clone();
        let target = request.k8s_target.to_string();
        match self.registry.deliver(request).await {
            DeliveryOutcome::Delivered => {
                debug!(target = %target, "Published patch request");
                summary.record_delivery(&kind);
            }
            DeliveryOutcome::NoSubscriber => {
                debug!(kind = %kind, target = %target, "No subscriber for kind, dropping");
                summary.unrouted += 1;
            }
            DeliveryOutcome::ConsumerGone => {
                summary.undeliverable += 1;
                record_patch_rejected(RejectReason::Undeliverable);
            }
        }
    }

    fn validate(&self, request: &PatchRequest) -> Result<(), ContractError> {
        request.validate(&self.cluster)
    }
}
