use crate::entry::LogLevel;
use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub flush: FlushConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// In-memory ring sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BufferConfig {
    /// Maximum buffered entries before the oldest is evicted
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Unflushed entries that trigger an early flush
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            flush_threshold: default_flush_threshold(),
        }
    }
}

fn default_capacity() -> usize {
    500
}

fn default_flush_threshold() -> usize {
    10
}

/// Periodic flush timer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlushConfig {
    #[serde(default = "default_flush_interval")]
    pub interval: HumanDuration,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval: default_flush_interval(),
        }
    }
}

fn default_flush_interval() -> HumanDuration {
    HumanDuration::from_secs(5)
}

/// Emission filtering
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggerConfig {
    /// Lowest level that is recorded; `"debug"` keeps everything
    #[serde(default = "default_min_level")]
    pub min_level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
        }
    }
}

fn default_min_level() -> LogLevel {
    LogLevel::Debug
}

/// Host availability probing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: HumanDuration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_delay() -> HumanDuration {
    HumanDuration::from_millis(100)
}

/// File-backed host settings (used by `FileBridge`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_export_file")]
    pub export_file: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_file: default_log_file(),
            export_file: default_export_file(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "diaglog.log".to_string()
}

fn default_export_file() -> String {
    "debug_logs.log".to_string()
}
