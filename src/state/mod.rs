//! Crawl state shared between the workers and handed back to callers
//!
//! # Components
//!
//! - `CrawlTask`: a URL and its depth, queued in the frontier
//! - `PageResult`: everything recorded about one fetched page
//! - `LinkGraph`: source → target edges between pages

mod link_graph;
mod page_result;

pub use link_graph::LinkGraph;
pub use page_result::{CrawlTask, Headings, ImageRef, PageResult};
