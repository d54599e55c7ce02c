//! Pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters recorded by the emitters, the flusher and the exporter
#[derive(Debug, Default)]
pub struct PipelineStats {
    entries_emitted: AtomicU64,
    entries_evicted: AtomicU64,
    entries_delivered: AtomicU64,
    flushes_delivered: AtomicU64,
    flushes_failed: AtomicU64,
    flushes_skipped: AtomicU64,
    exports_written: AtomicU64,
    exports_failed: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_emitted(&self) {
        self.entries_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_evicted(&self, count: usize) {
        if count > 0 {
            self.entries_evicted.fetch_add(count as u64, Ordering::Relaxed);
            tracing::debug!(counter = "entries_evicted", count, "Metric incremented");
        }
    }

    pub fn flush_delivered(&self, entries: usize) {
        self.flushes_delivered.fetch_add(1, Ordering::Relaxed);
        self.entries_delivered.fetch_add(entries as u64, Ordering::Relaxed);
        tracing::debug!(counter = "flushes_delivered", entries, "Metric incremented");
    }

    pub fn flush_failed(&self) {
        self.flushes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "flushes_failed", "Metric incremented");
    }

    pub fn flush_skipped(&self) {
        self.flushes_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "flushes_skipped", "Metric incremented");
    }

    pub fn export_written(&self) {
        self.exports_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn export_failed(&self) {
        self.exports_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            entries_emitted: self.entries_emitted.load(Ordering::Relaxed),
            entries_evicted: self.entries_evicted.load(Ordering::Relaxed),
            entries_delivered: self.entries_delivered.load(Ordering::Relaxed),
            flushes_delivered: self.flushes_delivered.load(Ordering::Relaxed),
            flushes_failed: self.flushes_failed.load(Ordering::Relaxed),
            flushes_skipped: self.flushes_skipped.load(Ordering::Relaxed),
            exports_written: self.exports_written.load(Ordering::Relaxed),
            exports_failed: self.exports_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub entries_emitted: u64,
    pub entries_evicted: u64,
    pub entries_delivered: u64,
    pub flushes_delivered: u64,
    pub flushes_failed: u64,
    pub flushes_skipped: u64,
    pub exports_written: u64,
    pub exports_failed: u64,
}
