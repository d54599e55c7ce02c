//! Client-side diagnostic logging pipeline
//!
//! Entries are captured synchronously into a bounded ring buffer, flushed in
//! batches to a host persistence bridge once it proves available, and can be
//! exported as a human-readable transcript on demand.

pub mod bridge;
pub mod config;
pub mod entry;
pub mod export;
pub mod humanize;
pub mod logger;
pub mod observability;
pub mod pipeline;
pub mod probe;
pub mod queue;
pub mod sink;

pub use bridge::{BridgeError, FileBridge, HostBridge, MemoryBridge};
pub use entry::{ErrorInfo, LogEntry, LogLevel, LogSource, UiAction};
pub use export::ExportOutcome;
pub use logger::{DebugLogger, LogContext, ScopedLogger, UiLogger};
pub use pipeline::{Pipeline, PipelineSettings};
pub use probe::{Availability, ProbeSettings, ProbeState};
pub use queue::FlushOutcome;
pub use sink::{GlobalSink, SinkError, SinkGuard};
