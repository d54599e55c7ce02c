use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Buffer capacity must be positive")]
    ZeroCapacity,

    #[error("Flush threshold must be positive")]
    ZeroFlushThreshold,

    #[error("Flush threshold ({threshold}) exceeds buffer capacity ({capacity})")]
    ThresholdExceedsCapacity { threshold: usize, capacity: usize },

    #[error("Flush interval must be positive")]
    ZeroFlushInterval,

    #[error("Probe max_retries must be positive")]
    ZeroProbeRetries,

    #[error("Host file name must not be empty: {field}")]
    EmptyFileName { field: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_buffer(config)?;
    validate_timers(config)?;
    validate_host(config)?;
    Ok(())
}

fn validate_buffer(config: &Config) -> Result<(), ValidationError> {
    let buffer = &config.buffer;

    if buffer.capacity == 0 {
        return Err(ValidationError::ZeroCapacity);
    }
    if buffer.flush_threshold == 0 {
        return Err(ValidationError::ZeroFlushThreshold);
    }
    // A threshold above capacity could never be reached
    if buffer.flush_threshold > buffer.capacity {
        return Err(ValidationError::ThresholdExceedsCapacity {
            threshold: buffer.flush_threshold,
            capacity: buffer.capacity,
        });
    }

    Ok(())
}

fn validate_timers(config: &Config) -> Result<(), ValidationError> {
    if config.flush.interval.is_zero() {
        return Err(ValidationError::ZeroFlushInterval);
    }
    if config.probe.max_retries == 0 {
        return Err(ValidationError::ZeroProbeRetries);
    }
    Ok(())
}

fn validate_host(config: &Config) -> Result<(), ValidationError> {
    for (field, value) in [
        ("host.log_file", &config.host.log_file),
        ("host.export_file", &config.host.export_file),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyFileName {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}
