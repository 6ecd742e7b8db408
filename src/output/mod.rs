//! Output module for crawl summaries and exports
//!
//! This module handles:
//! - Computing and printing crawl statistics
//! - Exporting page results and the link graph as JSON

pub mod json;
pub mod stats;

pub use json::{export_link_graph, export_results, write_link_graph, write_results};
pub use stats::{print_statistics, CrawlStatistics};
