use crate::config::types::CrawlConfig;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use seo_crawler::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Max depth: {}", config.max_depth);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<CrawlConfig> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads and parses a configuration file without validating it
///
/// The CLI uses this to apply command-line overrides before validation.
pub fn read_config(path: &Path) -> ConfigResult<CrawlConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text
pub fn parse_config(content: &str) -> ConfigResult<CrawlConfig> {
    Ok(toml::from_str(content)?)
}
