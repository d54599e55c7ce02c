use crate::bridge::HostBridge;
use crate::config::Config;
use crate::entry::{LogEntry, LogLevel};
use crate::export::{ExportOutcome, Exporter};
use crate::logger::{DebugLogger, Emitter, UiLogger};
use crate::observability::{PipelineStats, StatsSnapshot};
use crate::probe::{Availability, ProbeSettings, ProbeState, Prober};
use crate::queue::{FlushOutcome, Flusher, RingStore, Scheduler};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;
use uuid::Uuid;

/// Tunables for one pipeline instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub capacity: usize,
    pub flush_threshold: usize,
    pub flush_interval: Duration,
    /// Entries below this level are discarded at emission
    pub min_level: LogLevel,
    pub probe: ProbeSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            capacity: 500,
            flush_threshold: 10,
            flush_interval: Duration::from_secs(5),
            min_level: LogLevel::Debug,
            probe: ProbeSettings::default(),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            capacity: config.buffer.capacity,
            flush_threshold: config.buffer.flush_threshold,
            flush_interval: config.flush.interval.as_duration(),
            min_level: config.logger.min_level,
            probe: ProbeSettings {
                max_retries: config.probe.max_retries,
                retry_delay: config.probe.retry_delay.as_duration(),
            },
        }
    }
}

/// Pipeline owns the store, prober, flush scheduler and exporter
///
/// Architecture:
/// 1. Loggers push entries into the `RingStore` synchronously
/// 2. `Prober` settles host availability in the background
/// 3. A single `Scheduler` task flushes on a timer and on threshold requests
/// 4. `Exporter` renders the buffer for the host on demand
///
/// One instance is created by the process bootstrap and its loggers are
/// handed to call sites. Must be started inside a tokio runtime.
pub struct Pipeline {
    emitter: Emitter,
    prober: Prober,
    flusher: Arc<Flusher>,
    exporter: Arc<Exporter>,
    stats: Arc<PipelineStats>,
    session_id: Uuid,
    scheduler: Mutex<Option<Scheduler>>,
}

impl Pipeline {
    pub fn start(settings: PipelineSettings, bridge: Arc<dyn HostBridge>) -> Self {
        let session_id = Uuid::new_v4();
        info!(
            %session_id,
            capacity = settings.capacity,
            flush_threshold = settings.flush_threshold,
            min_level = %settings.min_level,
            "Starting log pipeline"
        );

        let store = Arc::new(RingStore::new(settings.capacity));
        let stats = Arc::new(PipelineStats::new());
        let flush_signal = Arc::new(Notify::new());
        let emitter = Emitter::new(
            store.clone(),
            flush_signal.clone(),
            settings.flush_threshold,
            settings.min_level,
            stats.clone(),
        );

        let prober = Prober::spawn(bridge.clone(), settings.probe, emitter.clone());
        let flusher = Arc::new(Flusher::new(
            store,
            bridge.clone(),
            prober.clone(),
            emitter.clone(),
            stats.clone(),
        ));
        let exporter = Arc::new(Exporter::new(
            bridge,
            prober.clone(),
            emitter.clone(),
            stats.clone(),
            session_id,
        ));
        let scheduler = Scheduler::spawn(flusher.clone(), flush_signal, settings.flush_interval);

        Self {
            emitter,
            prober,
            flusher,
            exporter,
            stats,
            session_id,
            scheduler: Mutex::new(Some(scheduler)),
        }
    }

    pub fn from_config(config: &Config, bridge: Arc<dyn HostBridge>) -> Self {
        Self::start(PipelineSettings::from(config), bridge)
    }

    pub fn debug_logger(&self) -> DebugLogger {
        DebugLogger::new(self.emitter.clone(), self.exporter.clone())
    }

    pub fn ui_logger(&self) -> UiLogger {
        UiLogger::new(self.emitter.clone())
    }

    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.emitter.store().snapshot()
    }

    pub fn clear_logs(&self) {
        self.emitter.store().clear();
    }

    pub async fn export_to_file(&self) -> ExportOutcome {
        self.exporter.export().await
    }

    /// Flush now, outside the timer. Skipped if a flush is already running.
    pub async fn flush(&self) -> FlushOutcome {
        self.flusher.flush().await
    }

    pub async fn availability(&self) -> Availability {
        self.prober.ready().await
    }

    pub fn probe_state(&self) -> ProbeState {
        self.prober.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Final flush attempt, then stop the periodic timer
    ///
    /// Calling it again only performs another flush attempt.
    pub async fn destroy(&self) -> FlushOutcome {
        let scheduler = self.scheduler.lock().take();
        match scheduler {
            Some(scheduler) => {
                let outcome = scheduler.stop().await;
                info!(?outcome, session_id = %self.session_id, "Log pipeline destroyed");
                outcome
            }
            None => self.flusher.flush().await,
        }
    }
}
