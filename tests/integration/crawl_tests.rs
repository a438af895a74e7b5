//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run whole jobs
//! end-to-end through the job registry.

use image_crawler::config::{Config, CrawlerConfig, ResultsConfig};
use image_crawler::crawler::CrawlSettings;
use image_crawler::job::{Job, JobRegistry, JobStatus};
use image_crawler::state::PageState;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a registry with a short request timeout
fn create_registry() -> JobRegistry {
    let config = Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 1,
            connect_timeout_secs: 1,
            ..CrawlerConfig::default()
        },
        ..Config::default()
    };
    let settings = CrawlSettings::from_config(&config).expect("Failed to build settings");
    JobRegistry::new(settings, &ResultsConfig::default())
}

/// Submits a job and waits for it to become terminal
async fn run_job(registry: &JobRegistry, urls: &[String], workers: i64) -> Arc<Job> {
    let job = registry
        .create_job(urls, workers)
        .await
        .expect("Failed to create job");
    tokio::time::timeout(Duration::from_secs(15), job.wait())
        .await
        .expect("Job did not finish in time");
    job
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_single_image() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<img src="/a.png">"#).await;

    let root = server.uri();
    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 1).await;

    assert_eq!(
        job.status(),
        JobStatus {
            completed: 1,
            in_progress: 0
        }
    );
    let result = job.result();
    assert_eq!(result.len(), 1);
    assert_eq!(result[&root], vec![format!("{}/a.png", root)]);
}

#[tokio::test]
async fn test_off_host_link_never_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="{}/elsewhere">x</a><a href="http://unreachable.invalid/">y</a>"#,
            other.uri()
        ),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html(r#"<img src="/leak.png">"#))
        .expect(0)
        .mount(&other)
        .await;

    let root = server.uri();
    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 2).await;

    assert!(job.result()[&root].is_empty());
    let frontier = job.frontier(&root).unwrap();
    assert_eq!(frontier.known_urls(), vec![format!("{}/", root)]);
    // `other` verifies its zero-request expectation on drop
}

#[tokio::test]
async fn test_image_suffix_filter() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/x.jpg"><img src="/y.jpeg"><img src="/z.PNG"><img src="/w.gif?v=2"><img src="/v.gif">"#,
    )
    .await;

    let root = server.uri();
    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 1).await;

    assert_eq!(
        job.result()[&root],
        vec![format!("{}/y.jpeg", root), format!("{}/v.gif", root)]
    );
}

#[tokio::test]
async fn test_zero_workers_still_completes() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/next">n</a>"#).await;
    mount_page(&server, "/next", r#"<img src="/n.gif">"#).await;

    let root = server.uri();
    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 0).await;

    assert_eq!(job.workers(), 1);
    assert_eq!(job.status().completed, 1);
    assert_eq!(job.result()[&root], vec![format!("{}/n.gif", root)]);
}

#[tokio::test]
async fn test_two_roots_four_workers() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    mount_page(&first, "/", r#"<a href="/p1">1</a><a href="/p2">2</a>"#).await;
    mount_page(&first, "/p1", r#"<img src="/one.png">"#).await;
    mount_page(&first, "/p2", r#"<img src="/two.png"><img src="/one.png">"#).await;
    mount_page(&second, "/", r#"<img src="/only.gif"><a href="/p1">1</a>"#).await;
    mount_page(&second, "/p1", "").await;

    let urls = vec![first.uri(), second.uri()];
    let registry = create_registry();
    let job = run_job(&registry, &urls, 4).await;

    assert_eq!(
        job.status(),
        JobStatus {
            completed: 2,
            in_progress: 0
        }
    );

    let result = job.result();
    assert_eq!(result.len(), 2);

    let mut first_images = result[&first.uri()].clone();
    first_images.sort();
    assert_eq!(
        first_images,
        vec![format!("{}/one.png", first.uri()), format!("{}/two.png", first.uri())]
    );
    assert_eq!(result[&second.uri()], vec![format!("{}/only.gif", second.uri())]);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    let root = server.uri();

    mount_page(&server, "/", r#"<a href="/a">a</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/a/b">b</a><img src="/a.png">"#).await;
    mount_page(&server, "/a/b", r#"<a href="/a/b/c">c</a><img src="/b.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/a/b/c"))
        .respond_with(html(r#"<img src="/c.png">"#))
        .expect(0)
        .mount(&server)
        .await;

    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 3).await;

    let mut images = job.result()[&root].clone();
    images.sort();
    assert_eq!(
        images,
        vec![format!("{}/a.png", root), format!("{}/b.png", root)]
    );

    let frontier = job.frontier(&root).unwrap();
    assert_eq!(
        frontier.state_of(&format!("{}/a/b", root)),
        Some(PageState::Crawled)
    );
    assert_eq!(frontier.state_of(&format!("{}/a/b/c", root)), None);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;
    let root = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/shared">1</a><a href="/p1">p1</a><a href="/p2">p2</a><a href="/shared">2</a>"#,
    )
    .await;
    mount_page(&server, "/p1", r#"<a href="/shared">s</a><a href="/">home</a>"#).await;
    mount_page(&server, "/p2", r#"<a href="/shared">s</a><a href="/p1">p1</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html(r#"<img src="/s.png">"#))
        .expect(1)
        .mount(&server)
        .await;

    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 4).await;

    let requests = server.received_requests().await.unwrap();
    let mut paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/", "/p1", "/p2", "/shared"]);
    assert_eq!(job.result()[&root], vec![format!("{}/s.png", root)]);
}

#[tokio::test]
async fn test_fetch_fault_does_not_stall_job() {
    let server = MockServer::start().await;
    let root = server.uri();

    mount_page(&server, "/", r#"<a href="/slow">s</a><a href="/fast">f</a>"#).await;
    mount_page(&server, "/fast", r#"<img src="/fast.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(r#"<img src="/slow.png">"#).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 2).await;

    assert_eq!(job.status().completed, 1);
    assert_eq!(job.result()[&root], vec![format!("{}/fast.png", root)]);

    let frontier = job.frontier(&root).unwrap();
    let slow = format!("{}/slow", root);
    assert_eq!(frontier.state_of(&slow), Some(PageState::Failed));
    let counts = frontier.counts();
    assert_eq!(counts.waiting, 0);
    assert_eq!(counts.processing, 0);
    assert_eq!(counts.crawled, 3);
    assert_eq!(counts.failed, 1);
}

#[tokio::test]
async fn test_error_status_page_still_scanned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"<img src="/missing.gif">"#))
        .mount(&server)
        .await;

    let root = server.uri();
    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 1).await;

    assert_eq!(job.result()[&root], vec![format!("{}/missing.gif", root)]);
}

#[tokio::test]
async fn test_unreachable_root_terminates() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let root = format!("http://127.0.0.1:{}/", port);

    let registry = create_registry();
    let job = run_job(&registry, &[root.clone()], 2).await;

    assert!(job.is_finished());
    assert!(job.finished_at().unwrap() >= job.created_at());
    assert_eq!(job.status().completed, 1);
    assert!(job.result()[&root].is_empty());
}

#[tokio::test]
async fn test_status_visible_while_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<img src="/late.png">"#).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let root = server.uri();
    let registry = create_registry();
    let job = registry.create_job(&[root.clone()], 1).await.unwrap();

    let status = registry.status(job.id().as_str()).await.unwrap();
    assert_eq!(status.completed + status.in_progress, 1);

    tokio::time::timeout(Duration::from_secs(15), job.wait())
        .await
        .expect("Job did not finish in time");
    assert_eq!(
        registry.status(job.id().as_str()).await,
        Some(JobStatus {
            completed: 1,
            in_progress: 0
        })
    );
    assert_eq!(
        registry.result(job.id().as_str()).await.unwrap()[&root],
        vec![format!("{}/late.png", root)]
    );
}
