//! HTTP job API
//!
//! Routes:
//! - `POST /jobs` submits a job
//! - `GET /jobs/{job_id}/status` and `GET /jobs/{job_id}/result` poll it
//! - `GET /health` reports liveness and the number of known jobs

mod api;

pub use api::{create_router, JobDefinition};

use crate::config::ServerConfig;
use crate::job::JobRegistry;
use crate::CrawlError;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Every job submitted to this process
    pub registry: Arc<JobRegistry>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self {
            registry,
            start_time: Instant::now(),
        }
    }
}

/// Builds the API router, with per-request tracing when enabled
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let router = create_router(state);
    if config.request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Binds the API listener
pub async fn bind(addr: &str) -> Result<TcpListener, CrawlError> {
    TcpListener::bind(addr).await.map_err(|source| CrawlError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Serves the router until `shutdown` resolves
///
/// Jobs still running when the server stops are dropped with the runtime.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), CrawlError> {
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!("Job API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Job API shutdown complete");
    Ok(())
}
