//! FeedClient over the raw HTTP transport, end to end against wiremock.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reelscroll_core::CancellationToken;
use reelscroll_engine::{EngineConfig, FeedClient};
use reelscroll_transport::{HttpTransport, TransportConfig};

async fn client_for(server: &MockServer) -> FeedClient {
    let config = TransportConfig::default()
        .with_base_url(server.uri())
        .with_api_key("k");
    let transport = HttpTransport::new(config).expect("Failed to create transport");
    FeedClient::create(Arc::new(transport), EngineConfig::default())
}

#[tokio::test]
async fn test_repeated_search_hits_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("ApiKey", "k"))
        .and(body_partial_json(json!({"operationName": "FindTags"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"findTags": {"count": 1, "tags": [{"id": "3", "name": "Beach"}]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let cancel = CancellationToken::new();
    let first = client.search_tags("beach", 20, &cancel).await;
    let second = client.search_tags("Beach ", 20, &cancel).await;

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name, "Beach");
    assert_eq!(second, first);
    client.dispose().await;
}

#[tokio::test]
async fn test_server_error_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let tags = client
        .search_tags("beach", 20, &CancellationToken::new())
        .await;

    assert!(tags.is_empty());
    assert_eq!(client.cache_stats().await.entries, 0);
    client.dispose().await;
}
