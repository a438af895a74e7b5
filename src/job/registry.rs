//! Job registry
//!
//! Maps job ids to jobs. Jobs are never removed; a finished job stays
//! queryable for the life of the process.

use crate::config::ResultsConfig;
use crate::crawler::CrawlSettings;
use crate::job::{Job, JobId, JobIdGenerator, JobResult, JobStatus};
use crate::CrawlError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry of every job submitted to this process
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<Job>>>,
    ids: JobIdGenerator,
    settings: Arc<CrawlSettings>,
    include_in_flight: bool,
}

impl JobRegistry {
    /// Creates an empty registry
    pub fn new(settings: CrawlSettings, results: &ResultsConfig) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            ids: JobIdGenerator::new(),
            settings: Arc::new(settings),
            include_in_flight: results.include_in_flight,
        }
    }

    /// Creates a job, registers it and starts crawling in the background
    ///
    /// # Arguments
    ///
    /// * `urls` - Root URLs; duplicates collapse onto the first occurrence
    /// * `workers` - Concurrent workers; values below 1 become 1
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<Job>)` - The registered, running job
    /// * `Err(CrawlError)` - No roots or an invalid root; nothing is registered
    pub async fn create_job(&self, urls: &[String], workers: i64) -> Result<Arc<Job>, CrawlError> {
        let id = self.ids.next_id();
        let job = Arc::new(Job::new(
            id.clone(),
            urls,
            workers,
            self.settings.clone(),
            self.include_in_flight,
        )?);

        self.jobs.write().await.insert(id, job.clone());

        let running = job.clone();
        tokio::spawn(async move {
            running.process().await;
        });

        Ok(job)
    }

    /// Looks up a job by id
    pub async fn get(&self, id: &str) -> Option<Arc<Job>> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Current status of a job, or None if the id is unknown
    pub async fn status(&self, id: &str) -> Option<JobStatus> {
        self.get(id).await.map(|job| job.status())
    }

    /// Current result of a job, or None if the id is unknown
    pub async fn result(&self, id: &str) -> Option<JobResult> {
        self.get(id).await.map(|job| job.result())
    }

    /// Number of registered jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
