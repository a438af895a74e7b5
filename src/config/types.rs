use serde::Deserialize;

/// Main configuration structure for the image crawler
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub results: ResultsConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the job API listens on
    #[serde(rename = "bind-address")]
    pub bind_address: String,

    /// Whether each HTTP request is traced
    #[serde(rename = "request-logging")]
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_logging: true,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Pages whose path beyond the root has fewer segments than this still
    /// have their outbound links followed
    #[serde(rename = "link-levels")]
    pub link_levels: usize,

    /// Whole-request timeout for a single page fetch (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on how long an idle worker sleeps before rescanning (milliseconds)
    #[serde(rename = "idle-poll-ms")]
    pub idle_poll_ms: u64,

    /// Maximum redirect hops followed per fetch
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Upper bound on the workers of a single job; larger requests are clamped
    #[serde(rename = "max-workers")]
    pub max_workers: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            link_levels: 2,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            idle_poll_ms: 50,
            max_redirects: 10,
            max_workers: 256,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "image-crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result aggregation policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Whether images found on pages still being fetched appear in results
    #[serde(rename = "include-in-flight")]
    pub include_in_flight: bool,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            include_in_flight: true,
        }
    }
}
