//! Emission API
//!
//! The only write path into the ring store. [`DebugLogger`] covers the
//! severity methods, [`UiLogger`] the UI-interaction methods; both funnel
//! into one shared [`Emitter`].
//!
//! Emission is synchronous and never fails: the entry is mirrored to the
//! console through `tracing`, pushed into the store, and a flush is
//! requested once enough entries have piled up since the last one.

mod debug;
mod ui;

pub use debug::{DebugLogger, ScopedLogger, DURATION_FIELD, PARENT_REQUEST_ID_FIELD, REQUEST_ID_FIELD};
pub use ui::UiLogger;

use crate::entry::{payload_from_value, LogEntry, LogLevel, LogSource, Payload};
use crate::observability::PipelineStats;
use crate::queue::{PushReceipt, RingStore};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Notify;

/// Call-site context attached to a severity entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    pub component: String,
    pub feature: Option<String>,
    pub action: Option<String>,
    pub source: LogSource,
    pub data: Option<Payload>,
}

impl LogContext {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn source(mut self, source: LogSource) -> Self {
        self.source = source;
        self
    }

    /// Replace the payload. Non-object values are wrapped under `value`.
    pub fn data(mut self, data: Value) -> Self {
        self.data = payload_from_value(data);
        self
    }

    /// Add a single payload field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Payload::new)
            .insert(key.into(), value.into());
        self
    }

    pub(crate) fn into_entry(self, level: LogLevel, message: String) -> LogEntry {
        let component = if self.component.is_empty() {
            "unknown".to_string()
        } else {
            self.component
        };

        let mut entry = LogEntry::new(level, self.source, component, message).with_data(self.data);
        entry.feature = self.feature;
        entry.action = self.action;
        entry
    }
}

impl From<&str> for LogContext {
    fn from(component: &str) -> Self {
        Self::new(component)
    }
}

impl From<String> for LogContext {
    fn from(component: String) -> Self {
        Self::new(component)
    }
}

/// Shared write path used by every logger facade
///
/// Entries below `min_level` are dropped before they reach the console
/// mirror or the store.
#[derive(Clone)]
pub struct Emitter {
    store: Arc<RingStore>,
    flush_signal: Arc<Notify>,
    flush_threshold: usize,
    min_level: LogLevel,
    stats: Arc<PipelineStats>,
}

impl Emitter {
    pub(crate) fn new(
        store: Arc<RingStore>,
        flush_signal: Arc<Notify>,
        flush_threshold: usize,
        min_level: LogLevel,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            store,
            flush_signal,
            flush_threshold: flush_threshold.max(1),
            min_level,
            stats,
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Record an entry and request a flush once the threshold is reached
    ///
    /// Returns `None` if the entry was filtered out by `min_level`.
    pub fn emit(&self, entry: LogEntry) -> Option<PushReceipt> {
        let receipt = self.record(entry, |store, entry| Some(store.push(entry)))?;
        self.request_flush(&receipt);
        Some(receipt)
    }

    /// Record an entry without ever requesting a flush
    pub(crate) fn emit_quiet(&self, entry: LogEntry) -> Option<PushReceipt> {
        self.record(entry, |store, entry| Some(store.push(entry)))
    }

    /// Record an entry only if the store lock is free right now
    ///
    /// Used from the panic hook, which may run on a thread that already
    /// holds the store lock.
    pub(crate) fn try_emit(&self, entry: LogEntry) -> Option<PushReceipt> {
        let receipt = self.record(entry, |store, entry| store.try_push(entry))?;
        self.request_flush(&receipt);
        Some(receipt)
    }

    pub(crate) fn store(&self) -> &Arc<RingStore> {
        &self.store
    }

    fn request_flush(&self, receipt: &PushReceipt) {
        if receipt.unflushed >= self.flush_threshold {
            self.flush_signal.notify_one();
        }
    }

    fn record(
        &self,
        entry: LogEntry,
        push: impl FnOnce(&RingStore, LogEntry) -> Option<PushReceipt>,
    ) -> Option<PushReceipt> {
        if entry.level < self.min_level {
            return None;
        }

        mirror(&entry);
        let receipt = push(self.store.as_ref(), entry)?;
        self.stats.entry_emitted();
        if receipt.evicted {
            self.stats.entries_evicted(1);
        }
        Some(receipt)
    }
}

/// Console mirror at the entry's own severity
fn mirror(entry: &LogEntry) {
    let component = entry.component.as_str();
    let feature = entry.feature.as_deref().unwrap_or("N/A");
    let action = entry.action.as_deref().unwrap_or("");
    let source = entry.source.as_str();
    let data = entry
        .data
        .as_ref()
        .map(|d| Value::Object(d.clone()).to_string())
        .unwrap_or_default();
    let error = entry.error.as_deref().unwrap_or("");

    match entry.level {
        LogLevel::Debug => {
            tracing::debug!(component, feature, action, source, data, "{}", entry.message)
        }
        LogLevel::Info => {
            tracing::info!(component, feature, action, source, data, "{}", entry.message)
        }
        LogLevel::Warn => {
            tracing::warn!(component, feature, action, source, data, error, "{}", entry.message)
        }
        LogLevel::Error => {
            tracing::error!(component, feature, action, source, data, error, "{}", entry.message)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_context_into_entry() {
        let entry = LogContext::new("Editor")
            .feature("autosave")
            .action("save")
            .source(LogSource::Backend)
            .field("chapter", 3)
            .into_entry(LogLevel::Info, "saved".to_string());

        assert_eq!(entry.component, "Editor");
        assert_eq!(entry.feature.as_deref(), Some("autosave"));
        assert_eq!(entry.action.as_deref(), Some("save"));
        assert_eq!(entry.source, LogSource::Backend);
        assert_eq!(entry.data.unwrap()["chapter"], 3);
    }

    #[test]
    fn test_empty_component_becomes_unknown() {
        let entry = LogContext::default().into_entry(LogLevel::Debug, "m".to_string());
        assert_eq!(entry.component, "unknown");
    }

    #[test]
    fn test_non_object_data_is_wrapped() {
        let ctx = LogContext::new("c").data(json!([1, 2, 3]));
        assert_eq!(ctx.data.unwrap()["value"], json!([1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_requests_flush() {
        let (emitter, signal) = test_support::emitter(100, 3);

        for i in 0..2 {
            emitter.emit(LogContext::new("c").into_entry(LogLevel::Info, format!("{i}")));
        }
        let early = tokio::time::timeout(Duration::from_millis(10), signal.notified()).await;
        assert!(early.is_err(), "no flush below threshold");

        emitter.emit(LogContext::new("c").into_entry(LogLevel::Info, "2".to_string()));
        let notified = tokio::time::timeout(Duration::from_millis(10), signal.notified()).await;
        assert!(notified.is_ok(), "flush requested at threshold");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_emit_never_requests_flush() {
        let (emitter, signal) = test_support::emitter(100, 1);

        emitter.emit_quiet(LogContext::new("c").into_entry(LogLevel::Debug, "m".to_string()));
        let notified = tokio::time::timeout(Duration::from_millis(10), signal.notified()).await;

        assert!(notified.is_err());
        assert_eq!(emitter.store().len(), 1);
    }

    #[test]
    fn test_entries_below_min_level_are_dropped() {
        let (emitter, _signal) = test_support::emitter_with_level(100, 100, LogLevel::Warn);

        let debug = emitter.emit(LogContext::new("c").into_entry(LogLevel::Debug, "d".to_string()));
        let info = emitter.emit_quiet(LogContext::new("c").into_entry(LogLevel::Info, "i".to_string()));
        let warn = emitter.emit(LogContext::new("c").into_entry(LogLevel::Warn, "w".to_string()));
        let error = emitter.emit(LogContext::new("c").into_entry(LogLevel::Error, "e".to_string()));

        assert!(debug.is_none());
        assert!(info.is_none());
        assert!(warn.is_some());
        assert!(error.is_some());

        let messages: Vec<String> = emitter.store().snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["w", "e"]);
    }

    #[test]
    fn test_try_emit_skips_when_store_is_locked() {
        let (emitter, _signal) = test_support::emitter(100, 100);
        let entry = || LogContext::new("c").into_entry(LogLevel::Error, "panic".to_string());

        let blocked = emitter.store().with_locked(|| emitter.try_emit(entry()));
        assert!(blocked.is_none());
        assert!(emitter.store().is_empty());

        assert!(emitter.try_emit(entry()).is_some());
        assert_eq!(emitter.store().len(), 1);
    }
}
