use crate::config::types::CrawlConfig;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on concurrent workers
const MAX_WORKERS: usize = 100;

/// Upper bound on retries per URL
const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> ConfigResult<()> {
    validate_start_url(&config.start_url)?;
    validate_limits(config)?;
    validate_user_agent(&config.user_agent)?;
    Ok(())
}

/// Validates the start URL: HTTP(S) with a host
fn validate_start_url(start_url: &str) -> ConfigResult<()> {
    let url = Url::parse(start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' must use HTTP or HTTPS",
            start_url
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' has no host",
            start_url
        )));
    }

    Ok(())
}

/// Validates numeric limits
fn validate_limits(config: &CrawlConfig) -> ConfigResult<()> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.worker_count < 1 || config.worker_count > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.worker_count
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }

    if config.frontier_capacity == Some(0) {
        return Err(ConfigError::Validation(
            "frontier_capacity must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent(user_agent: &str) -> ConfigResult<()> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

impl CrawlConfig {
    /// Validates the configuration before a crawl starts
    pub fn validate(&self) -> ConfigResult<()> {
        validate(self)
    }
}
