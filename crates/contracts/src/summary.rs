//! BatchSummary - outcome counters for one processed update batch

use std::collections::HashMap;
use std::time::Duration;

use crate::TargetKind;

/// What happened to the entries of one batch.
///
/// `received` always equals the sum of the other entry counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Entries in the batch
    pub received: usize,

    /// Requests handed to a subscriber queue
    pub delivered: usize,

    /// Entries whose payload failed to decode
    pub decode_failures: usize,

    /// Decoded requests rejected by validation
    pub validation_failures: usize,

    /// Valid requests with no subscriber for their kind
    pub unrouted: usize,

    /// Valid requests whose subscriber dropped its queue
    pub undeliverable: usize,

    /// Delivered requests per kind
    pub delivered_by_kind: HashMap<TargetKind, usize>,

    /// Wall time spent on the batch, including backpressure waits
    pub duration: Duration,
}

impl BatchSummary {
    /// Entries that did not reach a consumer
    pub fn skipped(&self) -> usize {
        self.received.saturating_sub(self.delivered)
    }

    /// Record one delivery for `kind`
    pub fn record_delivery(&mut self, kind: &TargetKind) {
        self.delivered += 1;
        *self.delivered_by_kind.entry(kind.clone()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_counts_everything_not_delivered() {
        let mut summary = BatchSummary {
            received: 4,
            decode_failures: 1,
            unrouted: 1,
            ..Default::default()
        };
        summary.record_delivery(&TargetKind::deployment());
        summary.record_delivery(&TargetKind::deployment());

        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.delivered_by_kind.get("deployment"), Some(&2));
    }
}
