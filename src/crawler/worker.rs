//! Worker pool draining a job's root frontiers
//!
//! Each worker repeatedly scans the job's frontiers in root order, claims
//! the first waiting URL it finds, fetches and parses it, folds the links
//! and images back into that root's frontier, and rescans from the top.
//! A worker that finds nothing to claim goes idle and exits once every
//! frontier is settled (nothing waiting, nothing processing); otherwise it
//! waits for a progress notification from a peer and rescans.

use crate::crawler::fetcher::{fetch_page, FetchResult};
use crate::crawler::parser::parse_page;
use crate::crawler::CrawlSettings;
use crate::state::RootCrawlState;
use crate::url::collects_links;
use std::sync::Arc;
use tokio::sync::Notify;

/// Per-worker counters, summed into a [`PoolReport`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Pages fetched and scanned
    pub pages: usize,
    /// Pages abandoned after a fetch fault
    pub failed: usize,
    /// Links newly admitted to a frontier
    pub links_admitted: usize,
    /// Images recorded (after per-page dedup)
    pub images: usize,
}

impl WorkerStats {
    fn absorb(&mut self, other: WorkerStats) {
        self.pages += other.pages;
        self.failed += other.failed;
        self.links_admitted += other.links_admitted;
        self.images += other.images;
    }
}

/// Outcome of a whole pool run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub totals: WorkerStats,
    /// Workers that ended abnormally (panicked)
    pub crashed: usize,
}

/// A claimed URL that must leave `processing` no matter how the worker exits
///
/// If the worker unwinds before the page is completed, the page is abandoned
/// on drop so its root can still settle.
struct Claim<'a> {
    frontier: &'a RootCrawlState,
    url: String,
    progress: &'a Notify,
    done: bool,
}

impl Claim<'_> {
    fn complete(mut self) {
        self.frontier.complete(&self.url);
        self.done = true;
    }

    fn abandon(mut self) {
        self.frontier.abandon(&self.url);
        self.done = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::warn!("Worker dropped {} mid-crawl, abandoning it", self.url);
            self.frontier.abandon(&self.url);
        }
        self.progress.notify_waiters();
    }
}

/// Workers sharing one job's frontiers
#[derive(Clone)]
pub struct WorkerPool {
    /// Label used in log lines (the job id)
    label: Arc<str>,
    frontiers: Arc<Vec<RootCrawlState>>,
    settings: Arc<CrawlSettings>,
    /// Signalled whenever a page is completed or new links are admitted
    progress: Arc<Notify>,
}

impl WorkerPool {
    /// Creates a pool over the given frontiers
    pub fn new(
        label: &str,
        frontiers: Arc<Vec<RootCrawlState>>,
        settings: Arc<CrawlSettings>,
    ) -> Self {
        Self {
            label: Arc::from(label),
            frontiers,
            settings,
            progress: Arc::new(Notify::new()),
        }
    }

    /// Runs `workers` concurrent workers and waits until every one has exited
    ///
    /// When this returns, every frontier is settled.
    pub async fn run(&self, workers: usize) -> PoolReport {
        let workers = workers.max(1);
        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let pool = self.clone();
                tokio::spawn(async move { pool.work(worker_id).await })
            })
            .collect();

        let mut report = PoolReport {
            workers,
            ..PoolReport::default()
        };
        for handle in handles {
            match handle.await {
                Ok(stats) => report.totals.absorb(stats),
                Err(e) => {
                    tracing::error!("Job {}: worker ended abnormally: {}", self.label, e);
                    report.crashed += 1;
                }
            }
        }
        report
    }

    /// Returns true once no frontier has waiting or processing URLs
    pub fn is_settled(&self) -> bool {
        self.frontiers.iter().all(RootCrawlState::is_settled)
    }

    async fn work(self, worker_id: usize) -> WorkerStats {
        let mut stats = WorkerStats::default();
        tracing::debug!("Job {}: worker {} started", self.label, worker_id);

        loop {
            if let Some(claim) = self.claim() {
                self.crawl(worker_id, claim, &mut stats).await;
                continue;
            }

            // Idle: register for wakeups before re-checking, so a completion
            // racing with this check is not missed
            let notified = self.progress.notified();
            if self.frontiers.iter().any(RootCrawlState::has_waiting) {
                continue;
            }
            if self.is_settled() {
                break;
            }
            let _ = tokio::time::timeout(self.settings.idle_poll, notified).await;
        }

        tracing::debug!(
            "Job {}: worker {} leaving after {} pages",
            self.label,
            worker_id,
            stats.pages
        );
        stats
    }

    /// Claims the first waiting URL, scanning frontiers in root order
    fn claim(&self) -> Option<Claim<'_>> {
        self.frontiers.iter().find_map(|frontier| {
            frontier.claim_next().map(|url| Claim {
                frontier,
                url,
                progress: &self.progress,
                done: false,
            })
        })
    }

    async fn crawl(&self, worker_id: usize, claim: Claim<'_>, stats: &mut WorkerStats) {
        let frontier = claim.frontier;
        tracing::debug!("Job {}: worker {} fetching {}", self.label, worker_id, claim.url);

        let body = match fetch_page(&self.settings.client, &claim.url).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::NetworkError { error } => {
                tracing::warn!("Job {}: failed to crawl {}: {}", self.label, claim.url, error);
                stats.failed += 1;
                claim.abandon();
                return;
            }
        };

        let collect = collects_links(
            &claim.url,
            frontier.root(),
            frontier.domain(),
            self.settings.link_levels,
        );
        let parsed = parse_page(&body, frontier.domain(), collect);

        let mut admitted = 0;
        for link in &parsed.links {
            if frontier.admit_link(link) {
                tracing::trace!("Job {}: admitted {}", self.label, link);
                admitted += 1;
            }
        }
        if admitted > 0 {
            self.progress.notify_waiters();
        }

        for image in &parsed.images {
            if frontier.record_image(&claim.url, image) {
                stats.images += 1;
            }
        }

        stats.pages += 1;
        stats.links_admitted += admitted;
        claim.complete();
    }
}
