//! Patch distribution metrics
//!
//! Exported through the `metrics` facade and aggregated in memory for
//! end-of-run summaries.

use std::collections::HashMap;

use contracts::BatchSummary;
use metrics::{counter, gauge, histogram};

/// Why an entry was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Payload is not a patch request
    Decode,
    /// Patch request failed validation
    Validation,
    /// No subscriber for the kind
    Unrouted,
    /// Subscriber dropped its queue
    Undeliverable,
}

impl RejectReason {
    /// Label value used on exported metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Validation => "validation",
            Self::Unrouted => "unrouted",
            Self::Undeliverable => "undeliverable",
        }
    }
}

/// Record metrics for one processed batch
///
/// # Example
///
/// ```ignore
/// let summary = processor.process(batch).await;
/// observability::metrics::record_batch_metrics(&summary);
/// ```
pub fn record_batch_metrics(summary: &BatchSummary) {
    counter!("patch_provider_batches_total").increment(1);
    counter!("patch_provider_updates_received_total").increment(summary.received as u64);
    histogram!("patch_provider_batch_size").record(summary.received as f64);
    histogram!("patch_provider_batch_duration_ms").record(summary.duration.as_secs_f64() * 1000.0);

    for (kind, count) in &summary.delivered_by_kind {
        counter!(
            "patch_provider_requests_delivered_total",
            "kind" => kind.to_string()
        )
        .increment(*count as u64);
    }

    for (reason, count) in [
        (RejectReason::Decode, summary.decode_failures),
        (RejectReason::Validation, summary.validation_failures),
        (RejectReason::Unrouted, summary.unrouted),
        (RejectReason::Undeliverable, summary.undeliverable),
    ] {
        if count > 0 {
            counter!(
                "patch_provider_requests_skipped_total",
                "reason" => reason.as_str()
            )
            .increment(count as u64);
        }
    }
}

/// Record a single rejected entry as it happens
pub fn record_patch_rejected(reason: RejectReason) {
    counter!(
        "patch_provider_rejections_total",
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record how many requests wait in a kind's delivery queue
pub fn record_queue_depth(kind: &str, depth: usize) {
    gauge!(
        "patch_provider_queue_depth",
        "kind" => kind.to_string()
    )
    .set(depth as f64);
}

/// In-memory aggregation of batch outcomes
#[derive(Debug, Clone, Default)]
pub struct DistributionAggregator {
    /// Batches processed
    pub total_batches: u64,

    /// Entries received across all batches
    pub total_received: u64,

    /// Requests delivered
    pub total_delivered: u64,

    /// Skipped entries per reason
    pub skipped: HashMap<&'static str, u64>,

    /// Delivered requests per kind
    pub delivered_by_kind: HashMap<String, u64>,

    /// Batch size statistics
    pub batch_size: RunningStats,

    /// Batch duration statistics (ms)
    pub batch_duration_ms: RunningStats,
}

impl DistributionAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the totals
    pub fn update(&mut self, summary: &BatchSummary) {
        self.total_batches += 1;
        self.total_received += summary.received as u64;
        self.total_delivered += summary.delivered as u64;

        for (reason, count) in [
            (RejectReason::Decode, summary.decode_failures),
            (RejectReason::Validation, summary.validation_failures),
            (RejectReason::Unrouted, summary.unrouted),
            (RejectReason::Undeliverable, summary.undeliverable),
        ] {
            if count > 0 {
                *self.skipped.entry(reason.as_str()).or_insert(0) += count as u64;
            }
        }

        for (kind, count) in &summary.delivered_by_kind {
            *self.delivered_by_kind.entry(kind.to_string()).or_insert(0) += *count as u64;
        }

        self.batch_size.push(summary.received as f64);
        self.batch_duration_ms
            .push(summary.duration.as_secs_f64() * 1000.0);
    }

    /// Build a summary report
    pub fn summary(&self) -> DistributionSummary {
        DistributionSummary {
            total_batches: self.total_batches,
            total_received: self.total_received,
            total_delivered: self.total_delivered,
            delivery_rate: if self.total_received > 0 {
                self.total_delivered as f64 / self.total_received as f64 * 100.0
            } else {
                0.0
            },
            skipped: self.skipped.clone(),
            delivered_by_kind: self.delivered_by_kind.clone(),
            batch_size: StatsSummary::from(&self.batch_size),
            batch_duration_ms: StatsSummary::from(&self.batch_duration_ms),
        }
    }
}

/// Aggregated report
#[derive(Debug, Clone, Default)]
pub struct DistributionSummary {
    pub total_batches: u64,
    pub total_received: u64,
    pub total_delivered: u64,
    pub delivery_rate: f64,
    pub skipped: HashMap<&'static str, u64>,
    pub delivered_by_kind: HashMap<String, u64>,
    pub batch_size: StatsSummary,
    pub batch_duration_ms: StatsSummary,
}

impl std::fmt::Display for DistributionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Patch Distribution Summary ===")?;
        writeln!(f, "Batches: {}", self.total_batches)?;
        writeln!(f, "Updates received: {}", self.total_received)?;
        writeln!(
            f,
            "Requests delivered: {} ({:.2}%)",
            self.total_delivered, self.delivery_rate
        )?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Batch duration (ms): {}", self.batch_duration_ms)?;

        if !self.delivered_by_kind.is_empty() {
            writeln!(f, "Delivered by kind:")?;
            for (kind, count) in &self.delivered_by_kind {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "Skipped:")?;
            for (reason, count) in &self.skipped {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TargetKind;
    use std::time::Duration;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut summary = BatchSummary {
            received: 3,
            decode_failures: 1,
            unrouted: 1,
            duration: Duration::from_millis(4),
            ..Default::default()
        };
        summary.record_delivery(&TargetKind::deployment());

        let mut aggregator = DistributionAggregator::new();
        aggregator.update(&summary);
        aggregator.update(&summary);

        assert_eq!(aggregator.total_batches, 2);
        assert_eq!(aggregator.total_received, 6);
        assert_eq!(aggregator.total_delivered, 2);
        assert_eq!(aggregator.skipped.get("decode"), Some(&2));
        assert_eq!(aggregator.skipped.get("validation"), None);
        assert_eq!(aggregator.delivered_by_kind.get("deployment"), Some(&2));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DistributionAggregator::new();
        let mut summary = BatchSummary {
            received: 2,
            validation_failures: 1,
            ..Default::default()
        };
        summary.record_delivery(&TargetKind::deployment());
        aggregator.update(&summary);

        let output = aggregator.summary().to_string();
        assert!(output.contains("Updates received: 2"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("validation: 1"));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls are no-ops and must not panic
        record_batch_metrics(&BatchSummary::default());
        record_patch_rejected(RejectReason::Decode);
        record_queue_depth("deployment", 3);
    }
}
