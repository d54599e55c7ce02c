use crate::bridge::HostBridge;
use crate::entry::{ErrorInfo, LogEntry, LogLevel, LogSource};
use crate::logger::Emitter;
use crate::observability::PipelineStats;
use crate::probe::{Availability, Prober};
use crate::queue::RingStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What a single flush invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing buffered
    Empty,
    /// Host unavailable; store left untouched
    Unavailable,
    /// Batch of this many entries accepted by the host
    Delivered(usize),
    /// Host rejected the batch; this many entries were put back in front
    Requeued(usize),
    /// Another flush was already in flight
    Skipped,
}

/// Flusher drains the ring store into the host bridge
///
/// Flow per call:
/// 1. Empty store → `Empty`
/// 2. Claim the in-flight slot, or return `Skipped`
/// 3. Await prober readiness; unavailable → `Unavailable`
/// 4. Take the whole buffer as one batch (single critical section)
/// 5. `store_entries(batch)`: ok → `Delivered`, err → requeue at the front
///    and log a WARN that does not request a flush → `Requeued`
pub struct Flusher {
    store: Arc<RingStore>,
    bridge: Arc<dyn HostBridge>,
    prober: Prober,
    emitter: Emitter,
    stats: Arc<PipelineStats>,
    in_flight: AtomicBool,
}

impl Flusher {
    pub fn new(
        store: Arc<RingStore>,
        bridge: Arc<dyn HostBridge>,
        prober: Prober,
        emitter: Emitter,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            store,
            bridge,
            prober,
            emitter,
            stats,
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn flush(&self) -> FlushOutcome {
        if self.store.is_empty() {
            return FlushOutcome::Empty;
        }

        let Some(_slot) = InFlight::claim(&self.in_flight) else {
            self.stats.flush_skipped();
            debug!("Flush already in flight, skipping");
            return FlushOutcome::Skipped;
        };

        if self.prober.ready().await == Availability::Unavailable {
            debug!(buffered = self.store.len(), "Host unavailable, flush aborted");
            return FlushOutcome::Unavailable;
        }

        let batch = self.store.take_batch();
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }
        let count = batch.len();

        match self.bridge.store_entries(&batch).await {
            Ok(()) => {
                self.stats.flush_delivered(count);
                debug!(entries = count, "Batch delivered to host");
                FlushOutcome::Delivered(count)
            }
            Err(e) => {
                self.stats.flush_failed();
                let evicted = self.store.requeue_front(batch);
                self.stats.entries_evicted(evicted);
                // Retry is left to the next periodic tick
                self.emitter.emit_quiet(
                    LogEntry::new(
                        LogLevel::Warn,
                        LogSource::System,
                        "FlushScheduler",
                        format!("Failed to flush {count} log entries, requeued"),
                    )
                    .with_feature("flush")
                    .with_error(ErrorInfo::from(&e)),
                );
                FlushOutcome::Requeued(count)
            }
        }
    }
}

/// RAII claim on the single in-flight flush slot
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Running consumer task: periodic tick + threshold requests
pub struct Scheduler {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<FlushOutcome>,
}

impl Scheduler {
    /// Spawn the single consumer task that owns periodic and threshold flushes
    pub fn spawn(flusher: Arc<Flusher>, flush_signal: Arc<Notify>, interval: Duration) -> Self {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(flusher, flush_signal, interval, shutdown_rx));
        Self { shutdown, task }
    }

    /// Stop the timer after one final flush attempt; returns that attempt's outcome
    pub async fn stop(self) -> FlushOutcome {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Flush scheduler task ended abnormally");
                FlushOutcome::Skipped
            }
        }
    }
}

async fn run(
    flusher: Arc<Flusher>,
    flush_signal: Arc<Notify>,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> FlushOutcome {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_ms = interval.as_millis() as u64, "Flush scheduler started");

    // After a rejected batch, threshold requests wait for the next tick
    let mut backing_off = false;

    loop {
        tokio::select! {
            // Sender dropped counts as shutdown too
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let outcome = flusher.flush().await;
                backing_off = matches!(outcome, FlushOutcome::Requeued(_));
                debug!(?outcome, trigger = "interval", "Flush finished");
            }
            _ = flush_signal.notified(), if !backing_off => {
                let outcome = flusher.flush().await;
                backing_off = matches!(outcome, FlushOutcome::Requeued(_));
                debug!(?outcome, trigger = "threshold", "Flush finished");
            }
        }
    }

    let outcome = flusher.flush().await;
    info!(?outcome, "Flush scheduler stopped");
    outcome
}
