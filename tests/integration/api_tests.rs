//! Integration tests for the job API
//!
//! Each test serves the router on an ephemeral port and talks to it with
//! reqwest; crawl targets are wiremock servers.

use image_crawler::config::{Config, ServerConfig};
use image_crawler::crawler::CrawlSettings;
use image_crawler::job::JobRegistry;
use image_crawler::server::{build_router, AppState, JobDefinition};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts the API on 127.0.0.1 and returns its base URL
async fn start_api() -> String {
    let config = Config::default();
    let settings = CrawlSettings::from_config(&config).expect("Failed to build settings");
    let registry = Arc::new(JobRegistry::new(settings, &config.results));
    let router = build_router(
        AppState::new(registry),
        &ServerConfig {
            request_logging: false,
            ..ServerConfig::default()
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn submit(api: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/jobs", api))
        .json(body)
        .send()
        .await
        .unwrap()
}

/// Polls the status endpoint until no root is in progress
async fn wait_for_completion(api: &str, job_id: &str) -> Value {
    for _ in 0..300 {
        let status: Value = reqwest::get(format!("{}/jobs/{}/status", api, job_id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if status["in_progress"] == 0 {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} did not complete", job_id);
}

#[tokio::test]
async fn test_submit_and_poll_job() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/gallery">g</a><img src="/logo.gif">"#),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/gallery"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<img src="/cat.jpeg">"#))
        .mount(&site)
        .await;

    let api = start_api().await;
    let response = submit(
        &api,
        &serde_json::json!({ "urls": [site.uri()], "workers": 2 }),
    )
    .await;
    assert_eq!(response.status(), 200);

    let created: JobDefinition = response.json().await.unwrap();
    assert!(created.job_id.parse::<i64>().is_ok());
    assert_eq!(created.urls, vec![site.uri()]);
    assert_eq!(created.workers, 2);

    let status = wait_for_completion(&api, &created.job_id).await;
    assert_eq!(status, serde_json::json!({ "completed": 1, "in_progress": 0 }));

    let result: BTreeMap<String, Vec<String>> =
        reqwest::get(format!("{}/jobs/{}/result", api, created.job_id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    let mut images = result[&site.uri()].clone();
    images.sort();
    assert_eq!(
        images,
        vec![format!("{}/cat.jpeg", site.uri()), format!("{}/logo.gif", site.uri())]
    );
}

#[tokio::test]
async fn test_job_ids_are_unique() {
    let api = start_api().await;
    let body = serde_json::json!({ "urls": ["http://127.0.0.1:9/"], "workers": 1 });

    let first: JobDefinition = submit(&api, &body).await.json().await.unwrap();
    let second: JobDefinition = submit(&api, &body).await.json().await.unwrap();
    assert_ne!(first.job_id, second.job_id);

    let health: Value = reqwest::get(format!("{}/health", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["jobs"], 2);
    assert!(health["uptime_secs"].is_u64());
}

#[tokio::test]
async fn test_wrong_content_type_rejected() {
    let api = start_api().await;
    let response = reqwest::Client::new()
        .post(format!("{}/jobs", api))
        .header("content-type", "text/plain")
        .body(r#"{"urls":["http://a.test/"],"workers":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_json_with_charset_accepted() {
    let api = start_api().await;
    let response = reqwest::Client::new()
        .post(format!("{}/jobs", api))
        .header("content-type", "application/json; charset=utf-8")
        .body(r#"{"urls":["http://127.0.0.1:9/"],"workers":1}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_null_workers_accepted() {
    let api = start_api().await;
    let response = submit(
        &api,
        &serde_json::json!({ "urls": ["http://127.0.0.1:9/"], "workers": null }),
    )
    .await;
    assert_eq!(response.status(), 200);

    let created: JobDefinition = response.json().await.unwrap();
    assert_eq!(created.workers, 0);
    assert!(!created.job_id.is_empty());
}

#[tokio::test]
async fn test_oversized_worker_count_accepted_and_capped() {
    let api = start_api().await;
    let response = submit(
        &api,
        &serde_json::json!({ "urls": ["http://127.0.0.1:9/"], "workers": 10_000_000_000i64 }),
    )
    .await;
    assert_eq!(response.status(), 200);

    let created: JobDefinition = response.json().await.unwrap();
    let status = wait_for_completion(&api, &created.job_id).await;
    assert_eq!(status["completed"], 1);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let api = start_api().await;
    let response = reqwest::Client::new()
        .post(format!("{}/jobs", api))
        .header("content-type", "application/json")
        .body(r#"{"urls": ["http://a.test/""#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_invalid_roots_rejected() {
    let api = start_api().await;

    let empty = submit(&api, &serde_json::json!({ "urls": [], "workers": 1 })).await;
    assert_eq!(empty.status(), 400);

    let relative = submit(&api, &serde_json::json!({ "urls": ["/just/a/path"], "workers": 1 })).await;
    assert_eq!(relative.status(), 400);

    let health: Value = reqwest::get(format!("{}/health", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["jobs"], 0);
}

#[tokio::test]
async fn test_unknown_job_not_found() {
    let api = start_api().await;

    for view in ["status", "result"] {
        let response = reqwest::get(format!("{}/jobs/12345/{}", api, view))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}

#[tokio::test]
async fn test_unknown_view_and_path_not_found() {
    let api = start_api().await;
    let created: JobDefinition = submit(
        &api,
        &serde_json::json!({ "urls": ["http://127.0.0.1:9/"], "workers": 1 }),
    )
    .await
    .json()
    .await
    .unwrap();

    let bad_view = reqwest::get(format!("{}/jobs/{}/progress", api, created.job_id))
        .await
        .unwrap();
    assert_eq!(bad_view.status(), 404);

    let bad_path = reqwest::get(format!("{}/jobs/{}", api, created.job_id))
        .await
        .unwrap();
    assert_eq!(bad_path.status(), 404);

    let listing = reqwest::get(format!("{}/jobs", api)).await.unwrap();
    assert_eq!(listing.status(), 404);
}
