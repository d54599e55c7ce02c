use super::{Emitter, LogContext};
use crate::entry::{ErrorInfo, LogEntry, LogLevel};
use crate::export::{ExportOutcome, Exporter};
use crate::sink::panic_message;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_FIELD: &str = "requestId";
pub const PARENT_REQUEST_ID_FIELD: &str = "parentRequestId";
pub const DURATION_FIELD: &str = "duration_ms";

/// Structured debug logger
///
/// Cheap to clone; every clone writes into the same pipeline.
#[derive(Clone)]
pub struct DebugLogger {
    emitter: Emitter,
    exporter: Arc<Exporter>,
}

impl DebugLogger {
    pub(crate) fn new(emitter: Emitter, exporter: Arc<Exporter>) -> Self {
        Self { emitter, exporter }
    }

    pub fn debug(&self, message: impl Into<String>, ctx: impl Into<LogContext>) {
        self.log(LogLevel::Debug, message.into(), ctx.into(), None);
    }

    pub fn info(&self, message: impl Into<String>, ctx: impl Into<LogContext>) {
        self.log(LogLevel::Info, message.into(), ctx.into(), None);
    }

    pub fn warn(&self, message: impl Into<String>, ctx: impl Into<LogContext>) {
        self.log(LogLevel::Warn, message.into(), ctx.into(), None);
    }

    /// Record a failure. Only the error's message and stack are kept.
    pub fn error(
        &self,
        message: impl Into<String>,
        error: Option<ErrorInfo>,
        ctx: impl Into<LogContext>,
    ) {
        self.log(LogLevel::Error, message.into(), ctx.into(), error);
    }

    /// Logger with a preset component/feature, so call sites pass only the message
    pub fn scoped(&self, ctx: impl Into<LogContext>) -> ScopedLogger {
        ScopedLogger {
            logger: self.clone(),
            ctx: ctx.into(),
        }
    }

    /// Snapshot of every buffered entry, oldest first
    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.emitter.store().snapshot()
    }

    /// Discard everything buffered, flushed or not
    pub fn clear_logs(&self) {
        let dropped = self.emitter.store().clear();
        tracing::info!(dropped, "Log buffer cleared");
    }

    /// Hand a transcript of the buffer to the host. Never fails.
    pub async fn export_to_file(&self) -> ExportOutcome {
        self.exporter.export().await
    }

    /// ERROR entry that is dropped rather than waiting on a busy store
    pub(crate) fn try_error(&self, message: String, error: ErrorInfo, ctx: LogContext) -> bool {
        let entry = ctx.into_entry(LogLevel::Error, message).with_error(error);
        self.emitter.try_emit(entry).is_some()
    }

    pub(crate) fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    fn log(&self, level: LogLevel, message: String, ctx: LogContext, error: Option<ErrorInfo>) {
        let mut entry = ctx.into_entry(level, message);
        if let Some(error) = error {
            entry = entry.with_error(error);
        }
        self.emitter.emit(entry);
    }
}

/// [`DebugLogger`] bound to a fixed context
#[derive(Clone)]
pub struct ScopedLogger {
    logger: DebugLogger,
    ctx: LogContext,
}

impl ScopedLogger {
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.ctx = self.ctx.feature(feature);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.ctx = self.ctx.action(action);
        self
    }

    pub fn context(&self) -> &LogContext {
        &self.ctx
    }

    /// Logger for a nested call: fresh request id, parented to this one
    pub fn child(&self, action: impl Into<String>) -> Self {
        let mut ctx = self.ctx.clone().action(action);
        if let Some(parent) = self.request_id() {
            ctx = ctx.field(PARENT_REQUEST_ID_FIELD, parent);
        }
        ctx = ctx.field(REQUEST_ID_FIELD, Uuid::now_v7().to_string());

        Self {
            logger: self.logger.clone(),
            ctx,
        }
    }

    pub fn request_id(&self) -> Option<String> {
        self.ctx
            .data
            .as_ref()
            .and_then(|data| data.get(REQUEST_ID_FIELD))
            .and_then(|id| id.as_str())
            .map(str::to_string)
    }

    /// Run `f` as a named action, logging its start and completion with
    /// `duration_ms`. A panic is logged at ERROR and then resumed.
    pub fn track<F, R>(&self, action: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let tracked = self.clone().with_action(action);
        tracked.info("Action started");
        let start = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(f));
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                tracked.finished("Action completed", duration_ms);
                value
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracked.logger.error(
                    format!("Action panicked after {duration_ms}ms"),
                    Some(ErrorInfo::from_message(message)),
                    tracked.ctx.clone().field(DURATION_FIELD, duration_ms),
                );
                panic::resume_unwind(payload)
            }
        }
    }

    /// Async counterpart of [`track`](Self::track)
    pub async fn track_async<F, R>(&self, action: &str, fut: F) -> R
    where
        F: Future<Output = R>,
    {
        let tracked = self.clone().with_action(action);
        tracked.info("Async action started");
        let start = Instant::now();

        let value = fut.await;

        tracked.finished("Async action completed", start.elapsed().as_millis() as u64);
        value
    }

    fn finished(&self, message: &str, duration_ms: u64) {
        self.logger
            .info(message, self.ctx.clone().field(DURATION_FIELD, duration_ms));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.logger.debug(message, self.ctx.clone());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.logger.info(message, self.ctx.clone());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.logger.warn(message, self.ctx.clone());
    }

    pub fn error(&self, message: impl Into<String>, error: Option<ErrorInfo>) {
        self.logger.error(message, error, self.ctx.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::test_support;
    use std::time::Duration;

    #[test]
    fn test_scoped_logger_applies_context() {
        let logger = test_support::debug_logger(LogLevel::Debug);
        let scoped = logger.scoped(LogContext::new("Editor")).with_feature("autosave");

        scoped.warn("disk slow");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].component, "Editor");
        assert_eq!(logs[0].feature.as_deref(), Some("autosave"));
        assert_eq!(logs[0].level, LogLevel::Warn);
    }

    #[test]
    fn test_min_level_filters_logger_calls() {
        let logger = test_support::debug_logger(LogLevel::Info);

        logger.debug("noise", "c");
        logger.info("signal", "c");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "signal");
    }

    #[test]
    fn test_track_logs_start_and_completion() {
        let logger = test_support::debug_logger(LogLevel::Debug);
        let scoped = logger.scoped("Importer");

        let value = scoped.track("parse", || 41 + 1);
        assert_eq!(value, 42);

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|e| e.action.as_deref() == Some("parse")));
        assert_eq!(logs[0].message, "Action started");
        assert_eq!(logs[1].message, "Action completed");
        assert!(logs[1].data.as_ref().unwrap()[DURATION_FIELD].is_u64());
    }

    #[test]
    fn test_track_logs_panic_and_resumes() {
        let logger = test_support::debug_logger(LogLevel::Debug);
        let scoped = logger.scoped("Importer");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            scoped.track("explode", || -> u32 { panic!("bad input") })
        }));
        assert!(result.is_err());

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].level, LogLevel::Error);
        assert_eq!(logs[1].action.as_deref(), Some("explode"));
        assert_eq!(logs[1].error.as_deref(), Some("bad input"));
        assert!(logs[1].message.starts_with("Action panicked after"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_async_records_duration() {
        let logger = test_support::debug_logger(LogLevel::Debug);
        let scoped = logger.scoped("Sync");

        let value = scoped
            .track_async("upload", async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                "done"
            })
            .await;
        assert_eq!(value, "done");

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].message, "Async action completed");
        let duration_ms = logs[1].data.as_ref().unwrap()[DURATION_FIELD].as_u64().unwrap();
        assert!((250..260).contains(&duration_ms));
    }

    #[test]
    fn test_child_links_request_ids() {
        let logger = test_support::debug_logger(LogLevel::Debug);
        let root = logger.scoped("Command");
        assert!(root.request_id().is_none());

        let child = root.child("load");
        let grandchild = child.child("query");
        let child_id = child.request_id().unwrap();

        grandchild.info("querying");

        let logs = logger.get_logs();
        let data = logs[0].data.as_ref().unwrap();
        assert_eq!(logs[0].action.as_deref(), Some("query"));
        assert_eq!(data[PARENT_REQUEST_ID_FIELD], child_id.as_str());
        assert_ne!(data[REQUEST_ID_FIELD], child_id.as_str());
        assert!(child.context().data.as_ref().unwrap().get(PARENT_REQUEST_ID_FIELD).is_none());
    }
}
