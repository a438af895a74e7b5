//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching (single attempt, transport faults reported, never retried)
//! - HTML parsing and link/image extraction
//! - The worker pool that drains a job's frontiers

mod fetcher;
mod parser;
mod worker;

pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use parser::{parse_page, ParsedPage};
pub use worker::{PoolReport, WorkerPool, WorkerStats};

use crate::config::Config;
use crate::CrawlError;
use reqwest::Client;
use std::time::Duration;

/// Settings shared by every worker of every job
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Shared HTTP client (connection pool, user agent, timeouts)
    pub client: Client,

    /// Link-collection threshold, see [`crate::url::collects_links`]
    pub link_levels: usize,

    /// Upper bound on an idle worker's sleep between rescans
    pub idle_poll: Duration,

    /// Largest worker count a job may run with
    pub max_workers: usize,
}

impl CrawlSettings {
    /// Builds the crawl settings and HTTP client from configuration
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;
        Ok(Self {
            client,
            link_levels: config.crawler.link_levels,
            idle_poll: Duration::from_millis(config.crawler.idle_poll_ms),
            max_workers: config.crawler.max_workers,
        })
    }
}
