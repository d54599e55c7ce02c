//! Host availability prober
//!
//! The host may finish initializing after the pipeline starts. The prober
//! checks [`HostBridge::probe`] up to `max_retries` times, `retry_delay`
//! apart, then settles for good: either the host is available, or it is
//! treated as unavailable for the rest of the pipeline's life.

use crate::bridge::HostBridge;
use crate::entry::{LogEntry, LogLevel, LogSource};
use crate::logger::Emitter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// Prober state machine: `Probing(attempt) -> Settled(Available | Unavailable)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Probing { attempt: u32 },
    Settled(Availability),
}

impl ProbeState {
    pub fn initial() -> Self {
        ProbeState::Probing { attempt: 0 }
    }

    /// Apply the result of one probe. Settled states never change.
    pub fn advance(self, probe_ok: bool, max_retries: u32) -> Self {
        match self {
            ProbeState::Settled(availability) => ProbeState::Settled(availability),
            ProbeState::Probing { .. } if probe_ok => ProbeState::Settled(Availability::Available),
            ProbeState::Probing { attempt } if attempt + 1 >= max_retries => {
                ProbeState::Settled(Availability::Unavailable)
            }
            ProbeState::Probing { attempt } => ProbeState::Probing {
                attempt: attempt + 1,
            },
        }
    }

    pub fn settled(&self) -> Option<Availability> {
        match self {
            ProbeState::Settled(availability) => Some(*availability),
            ProbeState::Probing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Handle on the readiness signal. Clones share the same prober.
#[derive(Clone)]
pub struct Prober {
    state: watch::Receiver<ProbeState>,
}

impl Prober {
    /// Start probing in the background. Must be called inside a tokio runtime.
    pub fn spawn(bridge: Arc<dyn HostBridge>, settings: ProbeSettings, emitter: Emitter) -> Self {
        let (tx, rx) = watch::channel(ProbeState::initial());
        tokio::spawn(run(bridge, settings, emitter, tx));
        Self { state: rx }
    }

    /// A prober that is already settled
    pub fn settled(availability: Availability) -> Self {
        let (_tx, rx) = watch::channel(ProbeState::Settled(availability));
        Self { state: rx }
    }

    pub fn state(&self) -> ProbeState {
        *self.state.borrow()
    }

    /// Wait until the prober settles. Returns immediately once it has.
    pub async fn ready(&self) -> Availability {
        if let Some(availability) = self.state().settled() {
            return availability;
        }

        let mut rx = self.state.clone();
        match rx.wait_for(|state| state.settled().is_some()).await {
            Ok(state) => state.settled().unwrap_or(Availability::Unavailable),
            // Prober task is gone without settling
            Err(_) => Availability::Unavailable,
        }
    }
}

async fn run(
    bridge: Arc<dyn HostBridge>,
    settings: ProbeSettings,
    emitter: Emitter,
    tx: watch::Sender<ProbeState>,
) {
    let mut state = ProbeState::initial();

    loop {
        let probe_ok = match bridge.probe() {
            Ok(ok) => ok,
            Err(e) => {
                let attempt = match state {
                    ProbeState::Probing { attempt } => attempt,
                    ProbeState::Settled(_) => 0,
                };
                emitter.emit_quiet(
                    LogEntry::new(
                        LogLevel::Debug,
                        LogSource::System,
                        "AvailabilityProber",
                        format!("Host probe {} failed: {}", attempt + 1, e),
                    )
                    .with_feature("host-probe"),
                );
                false
            }
        };

        state = state.advance(probe_ok, settings.max_retries);
        tx.send_replace(state);

        match state {
            ProbeState::Settled(Availability::Available) => {
                info!("Host bridge available");
                return;
            }
            ProbeState::Settled(Availability::Unavailable) => {
                warn!(
                    max_retries = settings.max_retries,
                    "Host bridge unavailable, logging is memory-only"
                );
                return;
            }
            ProbeState::Probing { attempt } => {
                debug!(attempt, "Host bridge not ready, retrying");
                tokio::time::sleep(settings.retry_delay).await;
            }
        }
    }
}
