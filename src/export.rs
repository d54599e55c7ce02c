//! Transcript export
//!
//! Renders the buffer as one human-readable line per entry and hands the
//! text to the host, which decides where the file goes.

use crate::bridge::HostBridge;
use crate::entry::{ErrorInfo, LogEntry, LogLevel, LogSource};
use crate::logger::Emitter;
use crate::observability::PipelineStats;
use crate::probe::{Availability, Prober};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const UNAVAILABLE_MESSAGE: &str = "cannot export, host unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported { location: String, entries: usize },
    Unavailable,
    Failed { reason: String },
}

/// Render one entry as a transcript line
pub fn format_line(entry: &LogEntry) -> String {
    let mut line = format!(
        "[{}] [{}] [{}] [{}] [{}] {}",
        entry.iso_timestamp(),
        entry.level,
        entry.source,
        entry.feature.as_deref().unwrap_or("N/A"),
        entry.component,
        entry.message
    );

    if let Some(data) = &entry.data {
        line.push_str(" | data: ");
        line.push_str(&Value::Object(data.clone()).to_string());
    }
    if let Some(error) = &entry.error {
        line.push_str(" | error: ");
        line.push_str(error);
    }

    line
}

/// Full transcript: session header followed by one line per entry
pub fn render_transcript(session_id: Uuid, entries: &[LogEntry]) -> String {
    let mut out = format!(
        "=== diaglog session {} ({} entries) ===\n",
        session_id,
        entries.len()
    );
    for entry in entries {
        out.push_str(&format_line(entry));
        out.push('\n');
    }
    out
}

pub struct Exporter {
    bridge: Arc<dyn HostBridge>,
    prober: Prober,
    emitter: Emitter,
    stats: Arc<PipelineStats>,
    session_id: Uuid,
}

impl Exporter {
    pub fn new(
        bridge: Arc<dyn HostBridge>,
        prober: Prober,
        emitter: Emitter,
        stats: Arc<PipelineStats>,
        session_id: Uuid,
    ) -> Self {
        Self {
            bridge,
            prober,
            emitter,
            stats,
            session_id,
        }
    }

    /// Export the current buffer. The buffer is left intact.
    pub async fn export(&self) -> ExportOutcome {
        if self.prober.ready().await == Availability::Unavailable {
            self.warn(UNAVAILABLE_MESSAGE.to_string(), None);
            return ExportOutcome::Unavailable;
        }

        let entries = self.emitter.store().snapshot();
        let transcript = render_transcript(self.session_id, &entries);

        match self.bridge.write_export_file(transcript).await {
            Ok(location) => {
                self.stats.export_written();
                info!(entries = entries.len(), %location, "Log transcript exported");
                ExportOutcome::Exported {
                    location,
                    entries: entries.len(),
                }
            }
            Err(e) => {
                self.stats.export_failed();
                let reason = e.to_string();
                self.warn(format!("Export failed: {reason}"), Some(ErrorInfo::from(&e)));
                ExportOutcome::Failed { reason }
            }
        }
    }

    fn warn(&self, message: String, error: Option<ErrorInfo>) {
        let mut entry = LogEntry::new(LogLevel::Warn, LogSource::System, "LogExporter", message)
            .with_feature("export");
        if let Some(error) = error {
            entry = entry.with_error(error);
        }
        self.emitter.emit(entry);
    }
}
