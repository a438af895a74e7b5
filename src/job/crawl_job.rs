use crate::crawler::{CrawlSettings, PoolReport, WorkerPool};
use crate::job::JobId;
use crate::state::RootCrawlState;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Root counters reported by the status endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Roots with nothing waiting and nothing processing
    pub completed: usize,
    /// Roots still being crawled
    pub in_progress: usize,
}

/// Root URL → deduplicated image URLs
pub type JobResult = BTreeMap<String, Vec<String>>;

/// Last derived status and result, guarded by the job's own lock
#[derive(Debug, Default)]
struct Snapshot {
    status: JobStatus,
    result: JobResult,
}

/// A crawl job: its roots, their frontiers and the worker pool draining them
pub struct Job {
    id: JobId,
    root_urls: Vec<String>,
    workers: usize,
    frontiers: Arc<Vec<RootCrawlState>>,
    pool: WorkerPool,
    include_in_flight: bool,
    created_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    finished: Notify,
    snapshot: Mutex<Snapshot>,
}

impl Job {
    /// Creates a job with one frontier per distinct root URL
    ///
    /// Duplicate roots collapse onto their first occurrence. The worker count
    /// is clamped to `1..=settings.max_workers`.
    ///
    /// # Returns
    ///
    /// * `Ok(Job)` - The job, not yet started
    /// * `Err(CrawlError)` - No roots, or a root that is not an absolute URL with a host
    pub fn new(
        id: JobId,
        urls: &[String],
        workers: i64,
        settings: Arc<CrawlSettings>,
        include_in_flight: bool,
    ) -> Result<Self, CrawlError> {
        let mut seen = HashSet::new();
        let root_urls: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();

        if root_urls.is_empty() {
            return Err(CrawlError::NoRoots);
        }

        let frontiers = root_urls
            .iter()
            .map(|root| RootCrawlState::new(root))
            .collect::<Result<Vec<_>, _>>()?;
        let frontiers = Arc::new(frontiers);

        let max_workers = settings.max_workers.max(1);
        let ceiling = i64::try_from(max_workers).unwrap_or(i64::MAX);
        let workers = usize::try_from(workers.clamp(1, ceiling)).unwrap_or(max_workers);
        let pool = WorkerPool::new(id.as_str(), frontiers.clone(), settings);

        Ok(Self {
            id,
            root_urls,
            workers,
            frontiers,
            pool,
            include_in_flight,
            created_at: Utc::now(),
            finished_at: Mutex::new(None),
            finished: Notify::new(),
            snapshot: Mutex::new(Snapshot::default()),
        })
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn root_urls(&self) -> &[String] {
        &self.root_urls
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *self.finished_at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true once the worker pool has exited
    pub fn is_finished(&self) -> bool {
        self.finished_at().is_some()
    }

    /// Frontier of the given root URL (as submitted)
    pub fn frontier(&self, root: &str) -> Option<&RootCrawlState> {
        self.frontiers.iter().find(|f| f.root() == root)
    }

    /// Runs the worker pool to completion
    ///
    /// Blocks until all workers have exited; the job is terminal afterwards.
    pub async fn process(&self) -> PoolReport {
        tracing::info!(
            "Job {} started: {} root(s), {} worker(s)",
            self.id,
            self.root_urls.len(),
            self.workers
        );

        let report = self.pool.run(self.workers).await;

        let now = Utc::now();
        *self.finished_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);
        self.finished.notify_waiters();

        let status = self.status();
        let (crawled, failed) = self
            .frontiers
            .iter()
            .map(RootCrawlState::counts)
            .fold((0, 0), |(crawled, failed), counts| {
                (crawled + counts.crawled, failed + counts.failed)
            });
        tracing::info!(
            "Job {} completed in {}ms: {} page(s) crawled, {} failed, {} image(s), roots {}/{}",
            self.id,
            (now - self.created_at).num_milliseconds(),
            crawled,
            failed,
            report.totals.images,
            status.completed,
            self.root_urls.len()
        );
        if report.crashed > 0 {
            tracing::warn!("Job {}: {} worker(s) ended abnormally", self.id, report.crashed);
        }
        report
    }

    /// Waits until [`Job::process`] has finished
    pub async fn wait(&self) {
        loop {
            let notified = self.finished.notified();
            if self.is_finished() {
                return;
            }
            notified.await;
        }
    }

    fn snapshot(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recomputes status and result from the frontiers
    ///
    /// A root is completed iff both its waiting and processing sets are
    /// empty. Each frontier is read under its own lock, one at a time.
    pub fn update_status(&self) -> (JobStatus, JobResult) {
        let snapshot = self.refresh();
        (snapshot.status, snapshot.result.clone())
    }

    /// Stores a freshly derived snapshot and returns it still locked
    fn refresh(&self) -> MutexGuard<'_, Snapshot> {
        let mut status = JobStatus::default();
        let mut result = JobResult::new();

        for frontier in self.frontiers.iter() {
            if frontier.is_settled() {
                status.completed += 1;
            } else {
                status.in_progress += 1;
            }
            result.insert(
                frontier.root().to_string(),
                frontier.images(self.include_in_flight),
            );
        }

        let mut snapshot = self.snapshot();
        snapshot.status = status;
        snapshot.result = result;
        snapshot
    }

    /// Current root counters
    pub fn status(&self) -> JobStatus {
        self.refresh().status
    }

    /// Current images per root
    pub fn result(&self) -> JobResult {
        self.refresh().result.clone()
    }

    /// Last computed status, without recomputing
    #[cfg(test)]
    fn last_status(&self) -> JobStatus {
        self.snapshot().status
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("root_urls", &self.root_urls)
            .field("workers", &self.workers)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
