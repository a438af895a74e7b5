//! Image crawler main entry point
//!
//! Command-line interface: serve the job API, run a one-off crawl, or check
//! a configuration file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use image_crawler::config::{load_config_with_hash, Config};
use image_crawler::crawler::CrawlSettings;
use image_crawler::job::JobRegistry;
use image_crawler::server::{self, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Image crawler: harvests png, gif and jpeg references from websites
///
/// Each job crawls its root URLs on their own hosts, follows links from the
/// root and its immediate children, and reports image URLs per root.
#[derive(Parser, Debug)]
#[command(name = "image-crawler")]
#[command(version)]
#[command(about = "A concurrent, job-based image crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the job API
    Serve {
        /// Listen address, overriding `server.bind-address`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Crawl the given root URLs once and print the result as JSON
    Crawl {
        /// Root URLs
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        /// Number of concurrent workers
        #[arg(short, long, default_value_t = 1)]
        workers: i64,
    },

    /// Validate the configuration and print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => handle_serve(config, bind).await,
        Command::Crawl { urls, workers } => handle_crawl(config, urls, workers).await,
        Command::CheckConfig => {
            print_config(&config);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_crawler=info,warn"),
            1 => EnvFilter::new("image_crawler=debug,tower_http=debug,info"),
            2 => EnvFilter::new("image_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn build_registry(config: &Config) -> anyhow::Result<Arc<JobRegistry>> {
    let settings = CrawlSettings::from_config(config).context("Failed to build HTTP client")?;
    Ok(Arc::new(JobRegistry::new(settings, &config.results)))
}

/// Handles `serve`: runs the job API until Ctrl-C
async fn handle_serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let registry = build_registry(&config)?;
    let router = server::build_router(AppState::new(registry), &config.server);

    let addr = bind.unwrap_or_else(|| config.server.bind_address.clone());
    let listener = server::bind(&addr).await?;

    server::serve(listener, router, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}

/// Handles `crawl`: one job, in-process, result printed to stdout
async fn handle_crawl(config: Config, urls: Vec<String>, workers: i64) -> anyhow::Result<()> {
    let registry = build_registry(&config)?;
    let job = registry
        .create_job(&urls, workers)
        .await
        .context("Failed to start crawl")?;

    tokio::select! {
        _ = job.wait() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, printing partial result");
        }
    }

    let result = serde_json::to_string_pretty(&job.result())?;
    println!("{}", result);
    Ok(())
}

/// Handles `check-config`: prints the effective configuration
fn print_config(config: &Config) {
    println!("=== Image Crawler Configuration ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);
    println!("  Request logging: {}", config.server.request_logging);

    println!("\nCrawler:");
    println!("  Link levels: {}", config.crawler.link_levels);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    println!("  Idle poll: {}ms", config.crawler.idle_poll_ms);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Max workers per job: {}", config.crawler.max_workers);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);

    println!("\nResults:");
    println!("  Include in-flight pages: {}", config.results.include_in_flight);

    println!("\n✓ Configuration is valid");
}
