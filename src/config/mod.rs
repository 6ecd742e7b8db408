//! Configuration module
//!
//! This module handles loading, parsing, and validating crawl configuration
//! from TOML files.
//!
//! # Example
//!
//! ```no_run
//! use seo_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlConfig, DomainFilter};

// Re-export parser functions
pub use parser::{load_config, parse_config, read_config};
