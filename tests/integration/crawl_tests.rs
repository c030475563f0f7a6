//! Integration tests for the spider
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl-then-report cycle end-to-end against a temporary database.

use depspider::canonicalize;
use depspider::config::Config;
use depspider::crawler::{run_crawl, StopReason};
use depspider::output::{generate_report, load_report, select_run, NodeStatus, RunReport};
use depspider::storage::{SqliteStorage, Storage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to a database inside `dir`
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.url_timeout = 5;
    config.crawler.max_depth = 5;
    config.user_agent.agent = "depspider-test/1.0".to_string();
    config.output.database_path = dir.path().join("crawl.sqlite3").display().to_string();
    config
}

async fn mount_html(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("HEAD"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, page: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(status).insert_header("content-type", "image/png"))
        .mount(server)
        .await;
}

fn status_of(report: &RunReport, url: &str) -> Option<NodeStatus> {
    let id = canonicalize(url);
    report.nodes.iter().find(|n| n.url == id).map(|n| n.status)
}

fn open_storage(config: &Config) -> SqliteStorage {
    SqliteStorage::new(Path::new(&config.output.database_path)).unwrap()
}

#[tokio::test]
async fn test_broken_dependency_flags_page_not_root() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/", r#"<html><body><a href="/p1">p1</a></body></html>"#).await;
    mount_html(
        &server,
        "/p1",
        r#"<html><body><img src="/img.png"></body></html>"#,
    )
    .await;
    mount_status(&server, "/img.png", 404).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let summary = run_crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(summary.stop_reason, StopReason::QueueExhausted);
    assert_eq!(summary.visited, 3);
    assert_eq!(summary.fetched, 3);

    let storage = open_storage(&config);
    let run = select_run(&storage, None, 0).unwrap();
    assert_eq!(run.id, summary.run_id);
    let report = load_report(&storage, run).unwrap();

    assert_eq!(status_of(&report, &format!("{}/", base)), Some(NodeStatus::Ok));
    assert_eq!(
        status_of(&report, &format!("{}/p1", base)),
        Some(NodeStatus::DependencyError)
    );
    assert_eq!(
        status_of(&report, &format!("{}/img.png", base)),
        Some(NodeStatus::ServerError)
    );
}

#[tokio::test]
async fn test_disallowed_host_is_probed_but_not_followed() {
    let server = MockServer::start().await;
    let port = server.address().port();

    // Same server, reached under a name outside the allow-host set
    let outside = format!("http://localhost:{}/outside", port);
    mount_html(
        &server,
        "/",
        &format!(r#"<a href="{}">outside</a>"#, outside),
    )
    .await;
    mount_html(&server, "/outside", r#"<a href="/deeper">deeper</a>"#).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let root = format!("http://127.0.0.1:{}/", port);
    let summary = run_crawl(&config, &root).await.unwrap();

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.known, 2);

    let requests = server.received_requests().await.unwrap();
    let outside_methods: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == "/outside")
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(outside_methods, ["HEAD"]);
    assert!(requests.iter().all(|r| r.url.path() != "/deeper"));

    let storage = open_storage(&config);
    let run = storage.get_run(summary.run_id).unwrap();
    let report = load_report(&storage, run).unwrap();
    assert_eq!(status_of(&report, &outside), Some(NodeStatus::Ok));
}

#[tokio::test]
async fn test_unreachable_link_marks_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Nothing listens on this port
    let dead_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dead = format!("http://127.0.0.1:{}/", dead_port);
    mount_html(&server, "/", &format!(r#"<a href="{}">dead</a>"#, dead)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.crawler.hosts.push("127.0.0.1".to_string());
    let summary = run_crawl(&config, &format!("{}/", base)).await.unwrap();
    assert_eq!(summary.visited, 2);

    let storage = open_storage(&config);
    let run = storage.get_run(summary.run_id).unwrap();
    let report = load_report(&storage, run).unwrap();

    assert_eq!(
        status_of(&report, &format!("{}/", base)),
        Some(NodeStatus::LinkError)
    );
    assert_eq!(status_of(&report, &dead), Some(NodeStatus::ConnectionError));
}

#[tokio::test]
async fn test_report_writes_dot_for_selected_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<link rel="stylesheet" href="/style.css"><a href="/docs/a.html">a</a>"#,
    )
    .await;
    mount_html(&server, "/docs/a.html", "<p>leaf</p>").await;
    mount_status(&server, "/style.css", 200).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let root = format!("{}/", base);
    let first = run_crawl(&config, &root).await.unwrap();
    let second = run_crawl(&config, &root).await.unwrap();
    assert!(second.run_id > first.run_id);

    let storage = open_storage(&config);

    let mut latest = Vec::new();
    let report = generate_report(&storage, None, 0, &mut latest).unwrap();
    assert_eq!(report.run.id, second.run_id);

    let mut previous = Vec::new();
    let report = generate_report(&storage, None, -1, &mut previous).unwrap();
    assert_eq!(report.run.id, first.run_id);
    assert_eq!(report.nodes.len(), 3);

    let dot = String::from_utf8(previous).unwrap();
    assert!(dot.starts_with(&format!("# Run_Id={}\ndigraph {{", first.run_id)));
    assert!(dot.contains(&format!("Root URL: {}", root)));
    assert!(dot.contains("label=\"a.html\""));
    assert!(dot.contains("label=\"/docs/\""));
    assert!(dot.trim_end().ends_with('}'));

    // one dependency edge and one link edge
    assert_eq!(dot.matches(" -> ").count(), 2);
}

#[tokio::test]
async fn test_url_budget_against_server() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_html(&server, "/", &links).await;
    for i in 1..=5 {
        mount_html(&server, &format!("/p{}", i), "").await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.crawler.max_urls = 3;
    let summary = run_crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(summary.stop_reason, StopReason::MaxUrls);
    assert_eq!(summary.visited, 3);

    let storage = open_storage(&config);
    assert_eq!(storage.fetch_totals(summary.run_id).unwrap().0, 3);
}
