//! Scriptable in-memory host, for tests and development

use super::{BridgeError, HostBridge, Result};
use crate::entry::LogEntry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// In-memory bridge whose availability and failures can be scripted
///
/// - `available_after`: probe number (1-based) from which the host reports
///   ready; `None` means never
/// - `fail_next_stores` / `fail_next_exports`: reject the next N calls
/// - `erroring_probes`: the first N probes return an error instead of `false`
#[derive(Debug, Default)]
pub struct MemoryBridge {
    available_after: Option<u32>,
    probes: AtomicU32,
    erroring_probes: AtomicU32,
    store_failures: AtomicU32,
    export_failures: AtomicU32,
    batches: Mutex<Vec<Vec<LogEntry>>>,
    exports: Mutex<Vec<String>>,
}

impl MemoryBridge {
    /// Host that is ready from the very first probe
    pub fn available() -> Self {
        Self::available_after(1)
    }

    /// Host that never becomes ready
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Host that becomes ready on probe number `probe` (1-based)
    pub fn available_after(probe: u32) -> Self {
        Self {
            available_after: Some(probe.max(1)),
            ..Self::default()
        }
    }

    pub fn with_erroring_probes(self, count: u32) -> Self {
        self.erroring_probes.store(count, Ordering::SeqCst);
        self
    }

    pub fn fail_next_stores(&self, count: u32) {
        self.store_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_exports(&self, count: u32) {
        self.export_failures.store(count, Ordering::SeqCst);
    }

    /// Number of probes made so far
    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    /// Every successfully stored batch, in call order
    pub fn batches(&self) -> Vec<Vec<LogEntry>> {
        self.batches.lock().clone()
    }

    /// All successfully delivered entries, flattened in delivery order
    pub fn delivered(&self) -> Vec<LogEntry> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Transcripts written through `write_export_file`
    pub fn exports(&self) -> Vec<String> {
        self.exports.lock().clone()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl HostBridge for MemoryBridge {
    fn probe(&self) -> Result<bool> {
        let attempt = self.probes.fetch_add(1, Ordering::SeqCst) + 1;

        if Self::take_failure(&self.erroring_probes) {
            return Err(BridgeError::Unavailable(format!(
                "probe {attempt} raised before host initialized"
            )));
        }

        Ok(self.available_after.is_some_and(|after| attempt >= after))
    }

    async fn store_entries(&self, entries: &[LogEntry]) -> Result<()> {
        if Self::take_failure(&self.store_failures) {
            return Err(BridgeError::Rejected("store_entries rejected".to_string()));
        }

        tracing::debug!(entries = entries.len(), "Memory bridge stored batch");
        self.batches.lock().push(entries.to_vec());
        Ok(())
    }

    async fn write_export_file(&self, content: String) -> Result<String> {
        if Self::take_failure(&self.export_failures) {
            return Err(BridgeError::Rejected("write_export_file rejected".to_string()));
        }

        let mut exports = self.exports.lock();
        exports.push(content);
        Ok(format!("memory://export/{}", exports.len()))
    }
}
