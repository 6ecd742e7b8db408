//! Crawl frontier and termination protocol
//!
//! The frontier owns all state shared between workers:
//! - the FIFO task queue (optionally bounded)
//! - the visited set, the only deduplication authority
//! - the pending counter of queued or in-flight tasks
//! - the result collection and its page limit
//! - the stop reason
//!
//! # Termination
//!
//! `pending` is incremented before a task becomes visible in the queue and
//! decremented when the [`Lease`] handed out by [`Frontier::dequeue`] is
//! dropped, which happens after the worker enqueued the task's children.
//! The count therefore reaches zero only when no task is queued and no
//! worker can produce new ones, and the frontier stops as `Quiescent` at
//! that moment.

use crate::state::{CrawlTask, PageResult};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Why a crawl stopped; the first recorded reason wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every discovered task was processed
    Quiescent,
    /// The page limit was reached
    LimitReached,
    /// The caller aborted the crawl
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiescent => f.write_str("frontier exhausted"),
            Self::LimitReached => f.write_str("page limit reached"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Outcome of storing a page result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// Stored; `total` results are now held
    Stored { total: usize },
    /// The page limit was already reached and the result was dropped
    Discarded,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shared crawl frontier
pub struct Frontier {
    queue: Mutex<VecDeque<CrawlTask>>,

    /// Queue bound; enqueues beyond it are dropped
    capacity: Option<usize>,

    visited: Mutex<HashSet<String>>,

    /// Tasks queued or held by a worker
    pending: AtomicUsize,

    results: Mutex<Vec<PageResult>>,
    max_pages: usize,

    stop_reason: Mutex<Option<StopReason>>,

    /// Woken on enqueue and on stop
    work: Notify,
    /// Woken on stop
    stop: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_pages` - Maximum number of results that will be stored
    /// * `capacity` - Optional bound on queued tasks
    pub fn new(max_pages: usize, capacity: Option<usize>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
            visited: Mutex::new(HashSet::new()),
            pending: AtomicUsize::new(0),
            results: Mutex::new(Vec::new()),
            max_pages,
            stop_reason: Mutex::new(None),
            work: Notify::new(),
            stop: Notify::new(),
        }
    }

    /// Adds a task without blocking
    ///
    /// Returns false if the frontier has stopped or is at capacity. A dropped
    /// task is logged at debug level.
    pub fn try_enqueue(&self, task: CrawlTask) -> bool {
        if self.is_stopped() {
            return false;
        }

        {
            let mut queue = lock(&self.queue);
            if let Some(capacity) = self.capacity {
                if queue.len() >= capacity {
                    tracing::debug!(url = %task.url, depth = task.depth, capacity, "Frontier full, dropping link");
                    return false;
                }
            }

            // Reserve before the task becomes visible to workers
            self.pending.fetch_add(1, Ordering::AcqRel);
            queue.push_back(task);
        }

        self.work.notify_waiters();
        true
    }

    /// Waits for the next task
    ///
    /// Returns `None` once the frontier has stopped. The returned lease keeps
    /// the task counted as pending until it is dropped.
    pub async fn dequeue(self: &Arc<Self>) -> Option<Lease> {
        loop {
            // Registered before checking so an enqueue in between is not missed
            let notified = self.work.notified();

            if self.is_stopped() {
                return None;
            }

            let next = lock(&self.queue).pop_front();
            if let Some(task) = next {
                return Some(Lease {
                    task,
                    frontier: Arc::clone(self),
                });
            }

            notified.await;
        }
    }

    fn release(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.stop(StopReason::Quiescent);
        }
    }

    /// Stops as `Quiescent` if nothing was ever enqueued or everything is done
    pub fn close_if_idle(&self) {
        if self.is_quiescent() {
            self.stop(StopReason::Quiescent);
        }
    }

    /// Marks a URL as visited
    ///
    /// Returns true for the first caller only.
    pub fn mark_visited(&self, url: &str) -> bool {
        lock(&self.visited).insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        lock(&self.visited).contains(url)
    }

    /// Stores a page result, re-checking the page limit under the lock
    ///
    /// Storing the result that reaches the limit stops the frontier with
    /// `LimitReached`.
    pub fn append(&self, page: PageResult) -> Append {
        let total = {
            let mut results = lock(&self.results);
            if results.len() >= self.max_pages {
                return Append::Discarded;
            }
            results.push(page);
            results.len()
        };

        if total >= self.max_pages {
            self.stop(StopReason::LimitReached);
        }

        Append::Stored { total }
    }

    /// Returns true once `max_pages` results are stored
    pub fn is_full(&self) -> bool {
        lock(&self.results).len() >= self.max_pages
    }

    pub fn result_count(&self) -> usize {
        lock(&self.results).len()
    }

    /// Returns true when no task is queued or in flight
    pub fn is_quiescent(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }

    /// Number of queued or in-flight tasks
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records a stop reason and wakes every waiter
    ///
    /// Returns true if this call decided the reason.
    pub fn stop(&self, reason: StopReason) -> bool {
        let first = {
            let mut stop_reason = lock(&self.stop_reason);
            if stop_reason.is_none() {
                *stop_reason = Some(reason);
                true
            } else {
                false
            }
        };

        if first {
            tracing::debug!(reason = %reason, "Frontier stopped");
        }

        self.work.notify_waiters();
        self.stop.notify_waiters();
        first
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        *lock(&self.stop_reason)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_reason().is_some()
    }

    /// Completes once the frontier has stopped
    pub async fn stopped(&self) {
        loop {
            let notified = self.stop.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }

    /// Takes the stored results, leaving the collection empty
    pub fn take_results(&self) -> Vec<PageResult> {
        std::mem::take(&mut *lock(&self.results))
    }
}

/// A dequeued task
///
/// The task stays counted as pending until the lease is dropped.
pub struct Lease {
    task: CrawlTask,
    frontier: Arc<Frontier>,
}

impl Lease {
    pub fn task(&self) -> &CrawlTask {
        &self.task
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.frontier.release();
    }
}
