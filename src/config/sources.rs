use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "DIAGLOG_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/diaglog.toml";
const ENV_PREFIX: &str = "DIAGLOG";
const ENV_SEPARATOR: &str = "__";

/// Host-provided log directory, honored when no explicit override is set
const APP_LOG_DIR_VAR: &str = "APP_LOG_DIR";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    apply_host_dir(&mut config);

    Ok(config)
}

/// Use the host's `APP_LOG_DIR` unless `DIAGLOG__HOST__LOG_DIR` was given
fn apply_host_dir(config: &mut Config) {
    let explicit = env::var(format!("{ENV_PREFIX}{ENV_SEPARATOR}HOST{ENV_SEPARATOR}LOG_DIR")).is_ok();
    if explicit {
        return;
    }

    if let Ok(dir) = env::var(APP_LOG_DIR_VAR) {
        config.host.log_dir = PathBuf::from(dir);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // DIAGLOG__BUFFER__CAPACITY -> buffer.capacity
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.buffer.capacity, 500);
        assert_eq!(config.flush.interval.as_millis(), 5_000);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[buffer]
capacity = 200
flush_threshold = 25

[flush]
interval = "2s"

[probe]
max_retries = 3
retry_delay = 250

[host]
log_dir = "/var/log/studio"
export_file = "transcript.log"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.buffer.capacity, 200);
        assert_eq!(config.buffer.flush_threshold, 25);
        assert_eq!(config.flush.interval.as_millis(), 2_000);
        assert_eq!(config.probe.max_retries, 3);
        assert_eq!(config.probe.retry_delay.as_millis(), 250);
        assert_eq!(config.host.log_dir, PathBuf::from("/var/log/studio"));
        assert_eq!(config.host.log_file, "diaglog.log");
        assert_eq!(config.host.export_file, "transcript.log");
    }

    #[test]
    fn test_malformed_duration_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[flush]\ninterval = \"soon\"\n").unwrap();

        assert!(load_from_sources(config_path).is_err());
    }

    // Environment overrides are left to integration tests: env::set_var is unsafe
    // under edition 2024 and races with parallel tests.
}
