//! SEO Crawler main entry point
//!
//! This is the command-line interface for the SEO crawler.

use anyhow::Context;
use clap::Parser;
use seo_crawler::config::{read_config, CrawlConfig, DomainFilter};
use seo_crawler::output::{export_link_graph, export_results, print_statistics, CrawlStatistics};
use seo_crawler::Crawler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SEO Crawler: a breadth-first site crawler
///
/// Crawls a website within depth and page limits while respecting
/// robots.txt, extracts SEO data from every page and builds the link graph.
#[derive(Parser, Debug)]
#[command(name = "seo-crawler")]
#[command(version)]
#[command(about = "A breadth-first SEO site crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from (overrides the config file)
    #[arg(value_name = "URL", required_unless_present = "config")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum link depth from the start URL
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Maximum number of pages to crawl
    #[arg(short = 'p', long)]
    max_pages: Option<usize>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Delay before each request, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// User-Agent header to send
    #[arg(long)]
    user_agent: Option<String>,

    /// Ignore robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Seed the crawl from the site's sitemap
    #[arg(long)]
    sitemap: bool,

    /// Which links to follow: "same" (start domain only) or "all"
    #[arg(long, value_name = "FILTER")]
    domain_filter: Option<DomainFilter>,

    /// Write page results as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the link graph as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    graph: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    tracing::debug!(?config, "Configuration loaded");

    let crawler = Crawler::new(config).context("Invalid crawl configuration")?;

    let results = match crawler.crawl().await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if let Some(path) = &cli.output {
        export_results(&results, path)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
    }

    if let Some(path) = &cli.graph {
        export_link_graph(&crawler.link_graph(), path)
            .with_context(|| format!("Failed to write link graph to {}", path.display()))?;
    }

    if !cli.quiet {
        print_statistics(&CrawlStatistics::from_results(&results));
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_crawler=info,warn"),
            1 => EnvFilter::new("seo_crawler=debug,info"),
            2 => EnvFilter::new("seo_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the crawl configuration from the config file and command-line flags
///
/// Flags override file values. The result is validated once all overrides
/// are applied.
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let mut config = match (&cli.config, &cli.url) {
        (Some(path), _) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        (None, Some(url)) => CrawlConfig::new(url.as_str()),
        (None, None) => anyhow::bail!("either a start URL or --config is required"),
    };

    if let Some(url) = &cli.url {
        config.start_url = url.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.delay_ms = delay_ms;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent = user_agent.clone();
    }
    if cli.ignore_robots {
        config.respect_robots = false;
    }
    if cli.sitemap {
        config.parse_sitemap = true;
    }
    if let Some(domain_filter) = cli.domain_filter {
        config.domain_filter = domain_filter;
    }

    config.validate()?;
    Ok(config)
}
