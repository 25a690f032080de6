//! Directory reader tests against a fake Consul.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use y2a_fleet::{
    DirectoryConfig, DirectoryHandle, DirectoryReader, FleetError, FleetSnapshot, NodeSelector,
    StartupPolicy,
};
use y2a_models::Role;

const KV_PATH: &str = "/v1/kv/test";

fn config(server: &MockServer, startup: StartupPolicy) -> DirectoryConfig {
    DirectoryConfig {
        consul_addr: server.uri(),
        prefix: "test".to_string(),
        poll_interval: Duration::from_millis(50),
        wait: None,
        request_timeout: Duration::from_secs(2),
        startup,
    }
}

fn kv_body(entries: &[(&str, &str)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(key, value)| json!({ "Key": key, "Value": STANDARD.encode(value) }))
            .collect(),
    )
}

fn listing(index: u64, entries: &[(&str, &str)]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("X-Consul-Index", index.to_string().as_str())
        .set_body_json(kv_body(entries))
}

async fn mount_listing(server: &MockServer, index: u64, entries: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(listing(index, entries))
        .mount(server)
        .await;
}

async fn mount_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("No cluster leader"))
        .mount(server)
        .await;
}

async fn wait_for_version(handle: &DirectoryHandle, version: u64) -> Arc<FleetSnapshot> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = handle.current();
            if snapshot.version() == version {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("poller should publish the expected version")
}

/// Strict startup refuses to run without a first listing.
#[tokio::test]
async fn test_strict_start_fails_when_consul_is_down() {
    let server = MockServer::start().await;
    mount_failure(&server).await;

    let result = DirectoryReader::start(config(&server, StartupPolicy::Strict)).await;

    assert!(matches!(result, Err(FleetError::Status(500, _))));
}

/// Lenient startup serves an empty fleet and fills it in once Consul answers.
#[tokio::test]
async fn test_lenient_start_serves_empty_fleet_then_populates() {
    let server = MockServer::start().await;
    mount_failure(&server).await;

    let handle = DirectoryReader::start(config(&server, StartupPolicy::Lenient))
        .await
        .expect("lenient start should not fail");

    let selector = NodeSelector::new(handle.view());
    assert!(handle.current().is_empty());
    assert!(matches!(
        selector.next(Role::Converter),
        Err(FleetError::EmptyRole(Role::Converter))
    ));

    server.reset().await;
    mount_listing(&server, 3, &[("test/ffmpeg/n1", "10.0.0.1:9000")]).await;

    let snapshot = wait_for_version(&handle, 3).await;

    assert_eq!(snapshot.nodes(Role::Converter).len(), 1);
    assert_eq!(selector.next(Role::Converter).unwrap().name, "n1");

    handle.shutdown().await;
}

/// A prefix with no keys yet is a valid, empty fleet.
#[tokio::test]
async fn test_no_nodes_yet_is_an_empty_fleet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Consul-Index", "12"))
        .mount(&server)
        .await;

    let handle = DirectoryReader::start(config(&server, StartupPolicy::Strict))
        .await
        .expect("404 is not a startup failure");

    let snapshot = handle.current();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.version(), 12);

    handle.shutdown().await;
}

/// After a warm start, an outage keeps the last known fleet in rotation.
#[tokio::test]
async fn test_stale_but_available_after_outage() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        5,
        &[
            ("test/ffmpeg/n1", "10.0.0.1:9000"),
            ("test/ffmpeg/n2", "10.0.0.2:9000"),
        ],
    )
    .await;

    let mut reader = DirectoryReader::new(config(&server, StartupPolicy::Strict)).unwrap();
    let selector = NodeSelector::new(reader.view());
    assert!(reader.poll_once().await.unwrap());

    server.reset().await;
    mount_failure(&server).await;

    assert!(reader.poll_once().await.is_err());
    assert!(reader.poll_once().await.is_err());

    let snapshot = selector.snapshot();
    assert_eq!(snapshot.version(), 5);
    assert_eq!(snapshot.nodes(Role::Converter).len(), 2);

    let picks: Vec<_> = (0..4)
        .map(|_| selector.next(Role::Converter).unwrap().name)
        .collect();
    assert_eq!(picks, vec!["n1", "n2", "n1", "n2"]);
}

/// Unknown directories and empty leaves never reach the snapshot.
#[tokio::test]
async fn test_listing_is_filtered_by_role_directory() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        8,
        &[
            ("test/ffmpeg/", ""),
            ("test/ffmpeg/n1", "10.0.0.1:9000"),
            ("test/http_api/api-1", "10.0.1.1:8080"),
            ("test/redis/main", "10.0.2.1:6379"),
        ],
    )
    .await;

    let mut reader = DirectoryReader::new(config(&server, StartupPolicy::Strict)).unwrap();
    let view = reader.view();
    reader.poll_once().await.unwrap();

    let snapshot = view.current();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.contains(Role::Converter, "10.0.0.1:9000"));
    assert!(snapshot.contains(Role::Api, "10.0.1.1:8080"));
    assert!(!snapshot.contains(Role::Converter, "10.0.2.1:6379"));
}

/// Successive listings are published in order; an unchanged index is a no-op.
#[tokio::test]
async fn test_versions_follow_consul_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(listing(4, &[("test/ffmpeg/n1", "10.0.0.1:9000")]))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    let mut reader = DirectoryReader::new(config(&server, StartupPolicy::Strict)).unwrap();
    let view = reader.view();

    assert!(reader.poll_once().await.unwrap());
    let first = view.current();
    assert!(!reader.poll_once().await.unwrap());
    assert!(Arc::ptr_eq(&first, &view.current()));

    mount_listing(
        &server,
        9,
        &[
            ("test/ffmpeg/n1", "10.0.0.1:9000"),
            ("test/ffmpeg/n2", "10.0.0.2:9000"),
        ],
    )
    .await;

    assert!(reader.poll_once().await.unwrap());
    assert_eq!(view.current().version(), 9);
    assert_eq!(view.current().nodes(Role::Converter).len(), 2);
}

/// With a wait configured, later polls become blocking queries on the last index.
#[tokio::test]
async fn test_blocking_query_uses_last_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .and(query_param("index", "4"))
        .and(query_param("wait", "1s"))
        .respond_with(listing(6, &[("test/ffmpeg/n2", "10.0.0.2:9000")]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(listing(4, &[("test/ffmpeg/n1", "10.0.0.1:9000")]))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server, StartupPolicy::Strict);
    cfg.wait = Some(Duration::from_secs(1));
    let mut reader = DirectoryReader::new(cfg).unwrap();
    let view = reader.view();

    reader.poll_once().await.unwrap();
    assert_eq!(view.current().version(), 4);

    reader.poll_once().await.unwrap();
    let snapshot = view.current();
    assert_eq!(snapshot.version(), 6);
    assert_eq!(snapshot.nodes(Role::Converter)[0].name, "n2");
}

/// A reset Consul (index going backwards) still replaces the fleet.
#[tokio::test]
async fn test_index_reset_publishes_fresh_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(listing(40, &[("test/ffmpeg/old", "10.0.0.1:9000")]))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(&server, 2, &[("test/ffmpeg/new", "10.0.0.5:9000")]).await;

    let mut reader = DirectoryReader::new(config(&server, StartupPolicy::Strict)).unwrap();
    let view = reader.view();

    reader.poll_once().await.unwrap();
    assert_eq!(view.current().version(), 40);

    assert!(reader.poll_once().await.unwrap());
    let snapshot = view.current();
    assert_eq!(snapshot.version(), 2);
    assert_eq!(snapshot.nodes(Role::Converter)[0].name, "new");
}

/// A listing body that is not JSON is rejected, and the fleet is left alone.
#[tokio::test]
async fn test_malformed_listing_is_rejected() {
    let server = MockServer::start().await;
    mount_listing(&server, 3, &[("test/ffmpeg/n1", "10.0.0.1:9000")]).await;

    let mut reader = DirectoryReader::new(config(&server, StartupPolicy::Strict)).unwrap();
    let view = reader.view();
    reader.poll_once().await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(KV_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Consul-Index", "7")
                .set_body_string("<html>proxy error</html>"),
        )
        .mount(&server)
        .await;

    assert!(matches!(
        reader.poll_once().await,
        Err(FleetError::Json(_))
    ));
    assert_eq!(view.current().version(), 3);
}
