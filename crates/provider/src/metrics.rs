//! Provider metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::BatchSummary;
use observability::{record_batch_metrics, DistributionAggregator, DistributionSummary};
use parking_lot::Mutex;

/// Running totals across all processed batches
#[derive(Debug, Default)]
pub struct ProviderMetrics {
    /// Batches processed, readable without taking the lock
    batches: AtomicU64,
    /// Requests delivered, readable without taking the lock
    delivered: AtomicU64,
    aggregator: Mutex<DistributionAggregator>,
}

impl ProviderMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a processed batch into the totals and export it
    pub fn observe(&self, summary: &BatchSummary) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(summary.delivered as u64, Ordering::Relaxed);
        self.aggregator.lock().update(summary);
        record_batch_metrics(summary);
    }

    /// Batches processed so far
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Requests delivered so far
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Aggregated report
    pub fn summary(&self) -> DistributionSummary {
        self.aggregator.lock().summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TargetKind;

    #[test]
    fn test_observe_accumulates() {
        let metrics = ProviderMetrics::new();
        let mut summary = BatchSummary {
            received: 2,
            unrouted: 1,
            ..Default::default()
        };
        summary.record_delivery(&TargetKind::deployment());

        metrics.observe(&summary);
        metrics.observe(&summary);

        assert_eq!(metrics.batch_count(), 2);
        assert_eq!(metrics.delivered_count(), 2);
        let report = metrics.summary();
        assert_eq!(report.total_received, 4);
        assert_eq!(report.skipped.get("unrouted"), Some(&2));
    }
}
