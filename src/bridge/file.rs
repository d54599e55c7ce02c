//! File-backed reference host
//!
//! Appends each delivered entry as one JSON line to `<log_dir>/<log_file>`
//! and writes export transcripts to `<log_dir>/<export_file>`.

use super::{HostBridge, Result};
use crate::config::HostConfig;
use crate::entry::LogEntry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct FileBridge {
    dir: PathBuf,
    log_path: PathBuf,
    export_path: PathBuf,
}

impl FileBridge {
    /// Create the bridge, making sure the log directory exists
    pub fn open(config: &HostConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.log_dir)?;
        info!("FileBridge writing to: {}", config.log_dir.display());

        Ok(Self {
            dir: config.log_dir.clone(),
            log_path: config.log_dir.join(&config.log_file),
            export_path: config.log_dir.join(&config.export_file),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }
}

#[async_trait]
impl HostBridge for FileBridge {
    fn probe(&self) -> Result<bool> {
        Ok(self.dir.is_dir())
    }

    async fn store_entries(&self, entries: &[LogEntry]) -> Result<()> {
        let mut buf = Vec::with_capacity(entries.len() * 128);
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;

        debug!(entries = entries.len(), path = %self.log_path.display(), "Batch appended");
        Ok(())
    }

    async fn write_export_file(&self, content: String) -> Result<String> {
        fs::write(&self.export_path, content).await?;
        Ok(self.export_path.to_string_lossy().to_string())
    }
}
