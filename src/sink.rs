//! Global sink registration
//!
//! Routes failures nobody logged explicitly into the pipeline: panics through
//! a process-wide panic hook, and errors from fire-and-forget tasks started
//! with [`SinkGuard::spawn`].

use crate::entry::ErrorInfo;
use crate::logger::{DebugLogger, LogContext};
use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

pub const HANDLER_COMPONENT: &str = "GlobalErrorHandler";
pub const UNCAUGHT_FEATURE: &str = "uncaught-error";
pub const REJECTION_FEATURE: &str = "unhandled-rejection";

static INSTALLED: AtomicBool = AtomicBool::new(false);

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Global sink is already installed")]
    AlreadyInstalled,
}

pub struct GlobalSink;

impl GlobalSink {
    /// Install the panic hook. Only one sink may be active per process.
    pub fn install(logger: DebugLogger) -> Result<SinkGuard, SinkError> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SinkError::AlreadyInstalled);
        }

        let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
        let chained = previous.clone();
        let hook_logger = logger.clone();

        panic::set_hook(Box::new(move |info| {
            if !record_uncaught(&hook_logger, panic_error_info(info)) {
                tracing::error!("Panic raised while the log store was locked, entry not buffered");
            }
            chained(info);
        }));

        tracing::debug!("Global error sink installed");

        Ok(SinkGuard {
            logger,
            previous: Some(previous),
        })
    }

    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::Acquire)
    }
}

/// Active registration. Uninstalls on drop.
pub struct SinkGuard {
    logger: DebugLogger,
    previous: Option<Arc<PanicHook>>,
}

impl SinkGuard {
    /// Run a fallible task; an `Err` nobody handled is reported as a rejection
    pub fn spawn<F, T, E>(&self, fut: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let logger = self.logger.clone();
        tokio::spawn(async move {
            match fut.await {
                Ok(value) => Some(value),
                Err(e) => {
                    report(&logger, &e);
                    None
                }
            }
        })
    }

    /// Report an unhandled async failure directly
    pub fn report_rejection(&self, err: &(dyn std::error::Error + 'static)) {
        report(&self.logger, err);
    }

    /// Restore the panic hook that was active before installation
    pub fn uninstall(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };

        // Drops our hook; the previous one is reinstated below
        let _ = panic::take_hook();
        panic::set_hook(Box::new(move |info| previous(info)));

        INSTALLED.store(false, Ordering::Release);
        tracing::debug!("Global error sink uninstalled");
    }
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

fn report(logger: &DebugLogger, err: &(dyn std::error::Error + 'static)) {
    let error = ErrorInfo::from_error(err);
    logger.error(
        format!("Unhandled rejection: {}", error.message),
        Some(error),
        LogContext::new(HANDLER_COMPONENT).feature(REJECTION_FEATURE),
    );
}

/// Push the panic entry without blocking on the store lock
///
/// The panicking thread may itself hold that lock; in that case nothing is
/// recorded and `false` is returned.
fn record_uncaught(logger: &DebugLogger, error: ErrorInfo) -> bool {
    logger.try_error(
        format!("Uncaught error: {}", error.message),
        error,
        LogContext::new(HANDLER_COMPONENT).feature(UNCAUGHT_FEATURE),
    )
}

/// Text of a panic payload (`&str` or `String`), if any
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Box<dyn Any>".to_string())
}

fn panic_error_info(info: &PanicHookInfo<'_>) -> ErrorInfo {
    let message = panic_message(info.payload());

    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "<unknown>".to_string());

    let stack = format!("{message}\n    at {location}\n{}", Backtrace::force_capture());
    ErrorInfo::new(message, stack)
}
