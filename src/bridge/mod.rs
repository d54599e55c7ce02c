//! Host bridge abstraction
//!
//! The host owns persistence. The pipeline only ever sees it through
//! [`HostBridge`]: a probe predicate plus two best-effort write operations.

pub mod file;
pub mod memory;

use crate::entry::LogEntry;
use async_trait::async_trait;
use thiserror::Error;

pub use file::FileBridge;
pub use memory::MemoryBridge;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Host bridge unavailable: {0}")]
    Unavailable(String),

    #[error("Host rejected the call: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Capability surface exposed by the host persistence layer
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// True once the host marker is present and the bridge is callable
    fn probe(&self) -> Result<bool>;

    /// Best-effort durable write of a batch, oldest entry first
    async fn store_entries(&self, entries: &[LogEntry]) -> Result<()>;

    /// Write a full transcript; returns the location the host chose
    async fn write_export_file(&self, content: String) -> Result<String>;
}
