//! Converter and metadata client tests against mock servers.

use std::time::Duration;

use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use y2a_client::{
    ClientError, ConverterClient, ConverterClientConfig, DispatchRequest, MetadataSource,
    VideoInfoClient, VideoInfoConfig,
};
use y2a_models::{JobId, Node, Role};

fn node_for(server: &MockServer) -> Node {
    // Stored addresses are bare host:port
    let address = server.uri().trim_start_matches("http://").to_string();
    Node::new(Role::Converter, "n1", address)
}

fn converter_client() -> ConverterClient {
    ConverterClient::new(ConverterClientConfig {
        dispatch_timeout: Duration::from_secs(2),
        delete_timeout: Duration::from_millis(300),
    })
    .unwrap()
}

/// Dispatch posts the job and accepts any 2xx.
#[tokio::test]
async fn test_dispatch_accepts_any_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/processing"))
        .and(body_json(serde_json::json!({ "job_id": "j1", "link": "http://cdn/a" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let request = DispatchRequest {
        job_id: JobId::from_string("j1"),
        link: "http://cdn/a".to_string(),
    };
    converter_client()
        .dispatch(&node_for(&server), &request)
        .await
        .expect("202 should be accepted");
}

/// A non-2xx dispatch answer is a rejection carrying the status.
#[tokio::test]
async fn test_dispatch_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/processing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let request = DispatchRequest {
        job_id: JobId::from_string("j1"),
        link: "http://cdn/a".to_string(),
    };
    let err = converter_client()
        .dispatch(&node_for(&server), &request)
        .await
        .unwrap_err();

    assert!(err.is_rejection());
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 503, .. }));
}

/// An unreachable worker is a dispatch error, not a panic.
#[tokio::test]
async fn test_dispatch_to_unreachable_node() {
    let node = Node::new(Role::Converter, "gone", "127.0.0.1:1");
    let request = DispatchRequest {
        job_id: JobId::from_string("j1"),
        link: "http://cdn/a".to_string(),
    };

    let err = converter_client().dispatch(&node, &request).await.unwrap_err();

    assert!(matches!(err, ClientError::RemoteDispatch { ref node, .. } if node == "gone"));
}

/// Delete succeeds on exactly 200.
#[tokio::test]
async fn test_delete_requires_ok() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete/item-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/delete/item-2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = converter_client();
    let node = node_for(&server);

    client.delete(&node, "item-1").await.expect("200 deletes");
    let err = client.delete(&node, "item-2").await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 204, .. }));
}

/// A stalled delete is cut off by the delete timeout.
#[tokio::test]
async fn test_delete_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = converter_client()
        .delete(&node_for(&server), "slow")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RemoteDispatch { .. }));
}

/// Metadata lookup sends the extracted video id and parses the body.
#[tokio::test]
async fn test_video_info_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_video_info"))
        .and(query_param("video_id", "dQw4w9WgXcQ"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("status=ok&title=Test+Video&url_encoded_fmt_stream_map=url%3Dhttp%253A%252F%252Fcdn%252Fv"),
        )
        .mount(&server)
        .await;

    let client = VideoInfoClient::new(VideoInfoConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let info = client
        .video_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        .await
        .unwrap();

    assert_eq!(info.id, "dQw4w9WgXcQ");
    assert_eq!(info.title, "Test Video");
    assert_eq!(info.dispatch_link("unused"), "http://cdn/v");
}

/// Links without a video id never reach the network.
#[tokio::test]
async fn test_video_info_rejects_foreign_link() {
    let client = VideoInfoClient::new(VideoInfoConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout: Duration::from_secs(1),
    })
    .unwrap();

    let err = client.video_info("https://vimeo.com/1").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidLink(_)));
}

/// A failure body from the metadata source is a metadata error.
#[tokio::test]
async fn test_video_info_reported_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_video_info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("status=fail&reason=Removed"))
        .mount(&server)
        .await;

    let client = VideoInfoClient::new(VideoInfoConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let err = client
        .video_info("https://youtu.be/dQw4w9WgXcQ")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Metadata(ref reason) if reason == "Removed"));
}
