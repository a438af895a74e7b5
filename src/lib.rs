//! Image Crawler: a concurrent, job-based image harvester
//!
//! This crate crawls one or more root URLs per job to a bounded link depth,
//! staying on each root's host and collecting `png`, `gif` and `jpeg` image
//! references. Jobs are submitted and polled through a small HTTP API.

pub mod config;
pub mod crawler;
pub mod job;
pub mod server;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid root URL '{url}': {reason}")]
    InvalidRoot { url: String, reason: String },

    #[error("A job needs at least one root URL")]
    NoRoots,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use job::{Job, JobId, JobRegistry, JobResult, JobStatus};
pub use state::{PageState, RootCrawlState};
