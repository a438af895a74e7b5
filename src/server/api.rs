//! REST API handlers for the job server

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};

use super::AppState;

// ============================================================================
// API Types
// ============================================================================

/// Job submission body, echoed back with `job_id` filled in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDefinition {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub workers: i64,
}

/// Reads `null` the same as an absent field
fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    jobs: usize,
    uptime_secs: u64,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/jobs", post(create_job).fallback(not_found))
        .route("/jobs/{job_id}/{view}", get(get_job_view))
        .fallback(not_found)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        jobs: state.registry.len().await,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Returns true for `application/json`, with or without parameters
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, message.into()).into_response()
}

/// Submit a job
async fn create_job(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_json(&headers) {
        return bad_request("Content-Type must be application/json");
    }

    let mut definition: JobDefinition = match serde_json::from_slice(&body) {
        Ok(definition) => definition,
        Err(e) => {
            tracing::debug!("Rejected job body: {}", e);
            return bad_request(format!("Invalid job definition: {}", e));
        }
    };

    match state
        .registry
        .create_job(&definition.urls, definition.workers)
        .await
    {
        Ok(job) => {
            tracing::info!(
                "Created job {} for {} root(s)",
                job.id(),
                job.root_urls().len()
            );
            definition.job_id = job.id().to_string();
            (StatusCode::OK, Json(definition)).into_response()
        }
        Err(e) => {
            tracing::debug!("Rejected job: {}", e);
            bad_request(e.to_string())
        }
    }
}

/// Job status or result
async fn get_job_view(
    State(state): State<AppState>,
    Path((job_id, view)): Path<(String, String)>,
) -> Response {
    let Some(job) = state.registry.get(&job_id).await else {
        return not_found().await;
    };

    match view.as_str() {
        "status" => Json(job.status()).into_response(),
        "result" => Json(job.result()).into_response(),
        _ => not_found().await,
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}
