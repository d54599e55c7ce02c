//! Configuration management for diaglog
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use diaglog::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Buffer capacity: {}", config.buffer.capacity);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `DIAGLOG__<section>__<key>`
//!
//! Examples:
//! - `DIAGLOG__BUFFER__CAPACITY=1000`
//! - `DIAGLOG__FLUSH__INTERVAL=10s`
//! - `DIAGLOG__PROBE__RETRY_DELAY=250ms`
//! - `DIAGLOG__LOGGER__MIN_LEVEL=info`
//!
//! `APP_LOG_DIR`, when set by the host, becomes `host.log_dir` unless
//! `DIAGLOG__HOST__LOG_DIR` is also set.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/diaglog.toml`.
//! This can be overridden using the `DIAGLOG_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{BufferConfig, Config, FlushConfig, HostConfig, LoggerConfig, ProbeConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
