use std::sync::atomic::{AtomicU64, Ordering};

/// Flush outcome counters for one hub.
#[derive(Debug, Default)]
pub struct HubMetrics {
    batches_flushed: AtomicU64,
    records_flushed: AtomicU64,
    batches_failed: AtomicU64,
    records_lost: AtomicU64,
    records_skipped: AtomicU64,
    records_rejected: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_flushed: u64,
    pub records_flushed: u64,
    pub batches_failed: u64,
    /// Records drained into a batch that could not be written.
    pub records_lost: u64,
    /// Records left out of a batch by the skip-record encoding policy.
    pub records_skipped: u64,
    /// Export calls refused by the lifetime error limit.
    pub records_rejected: u64,
}

impl HubMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_flush(&self, rows: u64) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.records_flushed.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_failed_batch(&self, rows: u64) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.records_lost.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self, count: u64) {
        self.records_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self, count: u64) {
        self.records_rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            records_lost: self.records_lost.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accumulates() {
        let metrics = HubMetrics::new();
        metrics.record_flush(100);
        metrics.record_flush(20);
        metrics.record_failed_batch(50);
        metrics.increment_skipped(2);
        metrics.increment_rejected(1);

        let snap = metrics.snapshot();
        assert_eq!(snap.batches_flushed, 2);
        assert_eq!(snap.records_flushed, 120);
        assert_eq!(snap.batches_failed, 1);
        assert_eq!(snap.records_lost, 50);
        assert_eq!(snap.records_skipped, 2);
        assert_eq!(snap.records_rejected, 1);
    }
}
