//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl engine that coordinates all aspects of
//! the crawling process, including:
//! - Normalizing the start URL and seeding the frontier (optionally from sitemaps)
//! - Running a fixed pool of workers over the shared frontier
//! - Coordinating fetching, parsing, and link discovery
//! - Logging progress while the crawl runs
//! - Handling interrupts and the page limit

use crate::config::{CrawlConfig, DomainFilter};
use crate::crawler::fetcher::{build_resource_client, FetchResult, Fetcher};
use crate::crawler::frontier::{Append, Frontier, StopReason};
use crate::crawler::parser::parse_html;
use crate::robots::RobotsCache;
use crate::sitemap::SitemapSeeder;
use crate::state::{CrawlTask, LinkGraph, PageResult};
use crate::url::{is_same_domain, normalize_url};
use crate::CrawlError;
use reqwest::Client;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Called with every stored page and the number of pages stored so far
///
/// Invoked from worker tasks, possibly concurrently. A slow callback slows
/// the worker that calls it.
pub type ProgressCallback = Arc<dyn Fn(&PageResult, usize) + Send + Sync>;

const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Main crawler structure
///
/// A crawler is built from a validated configuration and runs one crawl. The
/// link graph it assembles stays available after the crawl returns.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    fetcher: Fetcher,
    resource_client: Client,
    robots: Arc<RobotsCache>,
    link_graph: Arc<LinkGraph>,
    progress: Option<ProgressCallback>,
    progress_interval: Duration,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Configuration is valid and the HTTP client was built
    /// * `Err(CrawlError)` - Invalid configuration or HTTP client failure
    pub fn new(config: CrawlConfig) -> crate::Result<Self> {
        config.validate()?;

        let fetcher = Fetcher::from_config(&config)?;
        let resource_client = build_resource_client(&config)?;
        let robots = RobotsCache::new(
            resource_client.clone(),
            config.robots_agent(),
            config.respect_robots,
        );

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            resource_client,
            robots: Arc::new(robots),
            link_graph: Arc::new(LinkGraph::new()),
            progress: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Registers a callback invoked after each page result is stored
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(&PageResult, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    /// Sets how often the progress monitor logs
    pub fn set_progress_interval(&mut self, interval: Duration) {
        self.progress_interval = interval.max(Duration::from_millis(10));
    }

    /// The link graph assembled by the crawl
    pub fn link_graph(&self) -> Arc<LinkGraph> {
        Arc::clone(&self.link_graph)
    }

    /// Runs the crawl until the frontier is exhausted, the page limit is
    /// reached or Ctrl-C is pressed
    pub async fn crawl(&self) -> crate::Result<Vec<PageResult>> {
        self.crawl_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::warn!("Interrupt received, stopping crawl");
        })
        .await
    }

    /// Runs the crawl, aborting when `shutdown` completes
    ///
    /// # Flow
    ///
    /// 1. Normalize the start URL and build the seed list
    /// 2. Prime the frontier with the seeds at depth 0
    /// 3. Spawn the workers and the progress monitor
    /// 4. Wait until every worker has exited
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PageResult>)` - The crawl finished, hit the page limit, or was
    ///   aborted after storing at least one page
    /// * `Err(CrawlError::Cancelled)` - Aborted before any page was stored
    /// * `Err(CrawlError::InvalidUrl)` - The start URL cannot be normalized
    pub async fn crawl_with_shutdown<F>(&self, shutdown: F) -> crate::Result<Vec<PageResult>>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        tokio::pin!(shutdown);

        let start_url =
            normalize_url(&self.config.start_url).map_err(|source| CrawlError::InvalidUrl {
                url: self.config.start_url.clone(),
                source,
            })?;

        tracing::info!(
            url = %start_url,
            max_depth = self.config.max_depth,
            max_pages = self.config.max_pages,
            workers = self.config.worker_count,
            "Starting crawl"
        );

        let seeds = tokio::select! {
            biased;
            _ = &mut shutdown => return Err(CrawlError::Cancelled),
            seeds = self.seeds(&start_url) => seeds,
        };

        let frontier = Arc::new(Frontier::new(
            self.config.max_pages,
            self.config.frontier_capacity,
        ));
        for seed in seeds {
            frontier.try_enqueue(CrawlTask::new(seed, 0));
        }
        frontier.close_if_idle();

        let context = Arc::new(WorkerContext {
            config: Arc::clone(&self.config),
            fetcher: self.fetcher.clone(),
            robots: Arc::clone(&self.robots),
            link_graph: Arc::clone(&self.link_graph),
            frontier: Arc::clone(&frontier),
            progress: self.progress.clone(),
            start_url,
        });

        let mut workers = JoinSet::new();
        for id in 0..self.config.worker_count {
            workers.spawn(run_worker(Arc::clone(&context), id));
        }

        let monitor = tokio::spawn(run_monitor(Arc::clone(&frontier), self.progress_interval));

        let mut interrupted = false;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown, if !interrupted => {
                    interrupted = true;
                    frontier.stop(StopReason::Interrupted);
                }
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => tracing::error!(error = %e, "Worker task failed"),
                    None => break,
                },
            }
        }

        // Workers only exit once the frontier stopped; this covers panics
        frontier.stop(StopReason::Quiescent);
        monitor.abort();

        let reason = frontier.stop_reason().unwrap_or(StopReason::Quiescent);
        let results = frontier.take_results();

        tracing::info!(
            pages = results.len(),
            reason = %reason,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Crawl finished"
        );

        if reason == StopReason::Interrupted && results.is_empty() {
            return Err(CrawlError::Cancelled);
        }

        Ok(results)
    }

    async fn seeds(&self, start_url: &Url) -> Vec<String> {
        if !self.config.parse_sitemap {
            return vec![start_url.to_string()];
        }

        SitemapSeeder::new(self.resource_client.clone())
            .seed(start_url, self.config.domain_filter)
            .await
    }
}

/// State shared by the workers of one crawl
struct WorkerContext {
    config: Arc<CrawlConfig>,
    fetcher: Fetcher,
    robots: Arc<RobotsCache>,
    link_graph: Arc<LinkGraph>,
    frontier: Arc<Frontier>,
    progress: Option<ProgressCallback>,
    start_url: Url,
}

async fn run_worker(context: Arc<WorkerContext>, id: usize) {
    tracing::trace!(worker = id, "Worker started");

    while let Some(lease) = context.frontier.dequeue().await {
        let flow = context.process(lease.task()).await;
        // The lease is released only after children were enqueued
        drop(lease);

        if flow.is_break() {
            break;
        }
    }

    tracing::trace!(worker = id, "Worker exited");
}

impl WorkerContext {
    /// Processes one task
    ///
    /// 1. Limit and depth checks
    /// 2. Deduplication via the visited set
    /// 3. robots.txt check
    /// 4. Optional delay, then fetch with retry
    /// 5. Mark redirect hops visited
    /// 6. Extraction for 200 HTML responses
    /// 7. Store the result, record link graph edges
    /// 8. Enqueue in-scope children at depth + 1
    async fn process(&self, task: &CrawlTask) -> ControlFlow<()> {
        let frontier = &self.frontier;

        if frontier.is_full() {
            frontier.stop(StopReason::LimitReached);
            return ControlFlow::Break(());
        }

        if task.depth > self.config.max_depth {
            tracing::debug!(url = %task.url, depth = task.depth, "Depth limit exceeded, skipping");
            return ControlFlow::Continue(());
        }

        if !frontier.mark_visited(&task.url) {
            tracing::debug!(url = %task.url, "Already visited, skipping");
            return ControlFlow::Continue(());
        }

        let url = match Url::parse(&task.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %task.url, error = %e, "Unparseable task URL, skipping");
                return ControlFlow::Continue(());
            }
        };

        let allowed = tokio::select! {
            allowed = self.robots.is_allowed(&url) => allowed,
            _ = frontier.stopped() => return ControlFlow::Break(()),
        };
        match allowed {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(url = %task.url, "Disallowed by robots.txt, skipping");
                return ControlFlow::Continue(());
            }
            Err(e) => {
                tracing::debug!(url = %task.url, error = %e, "robots.txt check failed, skipping");
                return ControlFlow::Continue(());
            }
        }

        let delay = self.config.delay();
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = frontier.stopped() => return ControlFlow::Break(()),
            }
        }

        if frontier.is_full() {
            frontier.stop(StopReason::LimitReached);
            return ControlFlow::Break(());
        }

        let fetched = tokio::select! {
            fetched = self.fetcher.fetch_with_retry(&task.url) => fetched,
            _ = frontier.stopped() => return ControlFlow::Break(()),
        };

        let FetchResult { mut page, body, .. } = fetched;
        page.depth = task.depth;

        let owns_target = self.claim_redirect_chain(&task.url, &page.redirect_chain);
        if !owns_target {
            tracing::debug!(
                url = %task.url,
                final_url = page.final_url(),
                "Redirect target already claimed, not following its links"
            );
        }

        if let Some(body) = body.filter(|_| page.is_ok() && page.is_html()) {
            let base = Url::parse(page.final_url()).unwrap_or_else(|_| url.clone());
            parse_html(&body, &base).apply(&mut page);
        }

        let follow = page.is_ok() && owns_target;
        let source = page.url.clone();
        let links: Vec<String> = page.all_links().cloned().collect();
        let children: Vec<String> = match self.config.domain_filter {
            DomainFilter::Same => page.internal_links.clone(),
            DomainFilter::All => links.clone(),
        };
        let snapshot = self.progress.as_ref().map(|_| page.clone());
        let status = page.status_code;

        let total = match frontier.append(page) {
            Append::Stored { total } => total,
            Append::Discarded => {
                tracing::debug!(url = %source, "Page limit reached, discarding result");
                return ControlFlow::Break(());
            }
        };

        tracing::debug!(url = %source, status = ?status, depth = task.depth, total, "Crawled page");

        if let (Some(callback), Some(snapshot)) = (&self.progress, snapshot) {
            callback(&snapshot, total);
        }

        self.link_graph.add_edges(&source, &links);

        if follow {
            self.enqueue_children(task.depth + 1, children);
        }

        ControlFlow::Continue(())
    }

    /// Marks every hop of a redirect chain as visited
    ///
    /// Returns false when the final hop had already been claimed by another
    /// task. That task fetches the target itself and follows its links.
    fn claim_redirect_chain(&self, requested: &str, chain: &[String]) -> bool {
        let mut owns_target = true;
        for hop in chain {
            owns_target = match normalize_url(hop) {
                Ok(hop) => {
                    let hop = hop.to_string();
                    hop == requested || self.frontier.mark_visited(&hop)
                }
                Err(_) => true,
            };
        }
        owns_target
    }

    fn enqueue_children(&self, depth: u32, children: Vec<String>) {
        if depth > self.config.max_depth {
            tracing::debug!(count = children.len(), depth, "Depth limit reached, not enqueuing links");
            return;
        }

        for link in children {
            if self.frontier.is_stopped() {
                return;
            }

            if self.frontier.is_visited(&link) {
                continue;
            }

            if self.config.domain_filter == DomainFilter::Same {
                let same_site = Url::parse(&link)
                    .map(|url| is_same_domain(&url, &self.start_url))
                    .unwrap_or(false);
                if !same_site {
                    continue;
                }
            }

            self.frontier.try_enqueue(CrawlTask::new(link, depth));
        }
    }
}

/// Logs crawl progress at a fixed interval until the frontier stops
async fn run_monitor(frontier: Arc<Frontier>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = frontier.stopped() => break,
            _ = ticker.tick() => {
                let queued = frontier.len();
                tracing::info!(
                    pages = frontier.result_count(),
                    queued,
                    in_flight = frontier.pending().saturating_sub(queued),
                    "Crawl progress"
                );
            }
        }
    }
}
