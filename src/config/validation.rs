use crate::config::types::{AnalyzerConfig, ClientConfig, Config};
use crate::ConfigError;

/// Upper bound on concurrent link probes
pub const MAX_PROBE_CONCURRENCY: usize = 256;

/// Upper bound on followed redirects
pub const MAX_REDIRECTS: usize = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_analyzer_config(&config.analyzer)?;
    validate_client_config(&config.client)?;
    Ok(())
}

/// Validates pipeline sizing
fn validate_analyzer_config(config: &AnalyzerConfig) -> Result<(), ConfigError> {
    if config.probe_concurrency < 1 || config.probe_concurrency > MAX_PROBE_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "probe_concurrency must be between 1 and {}, got {}",
            MAX_PROBE_CONCURRENCY, config.probe_concurrency
        )));
    }

    if config.queue_capacity == Some(0) {
        return Err(ConfigError::Validation(
            "queue_capacity must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_redirects > MAX_REDIRECTS {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= {}, got {}",
            MAX_REDIRECTS, config.max_redirects
        )));
    }

    Ok(())
}
