//! Integration tests for the context API client against a mock HTTP server.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ctxbridge_client::{
    ContextApi, ContextApiClient, ContextConfig, ErrorKind, InsertContextRequest, InsertMetadata,
    SearchContextRequest, SearchFilters,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>, timeout_ms: u64) -> ContextApiClient {
    let config = ContextConfig::new(
        &format!("{}/insert", server.uri()),
        &format!("{}/search", server.uri()),
        api_key.map(String::from),
        timeout_ms,
    )
    .expect("valid config");
    ContextApiClient::new(config).expect("Failed to create client")
}

/// Matches requests that carry no Authorization header.
struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

/// Stub store: remembers inserted content and returns it as search hits.
#[derive(Clone, Default)]
struct EchoStore {
    contents: Arc<Mutex<Vec<String>>>,
}

struct EchoInsert(EchoStore);
struct EchoSearch(EchoStore);

impl Respond for EchoInsert {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().unwrap_or(Value::Null);
        let content = body["content"].as_str().unwrap_or_default().to_string();
        let mut contents = self.0.contents.lock().unwrap();
        contents.push(content);
        ResponseTemplate::new(201).set_body_json(json!({"id": contents.len()}))
    }
}

impl Respond for EchoSearch {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let contents = self.0.contents.lock().unwrap();
        let rows: Vec<Value> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| json!({"id": i + 1, "content": c, "distance": 0.1}))
            .collect();
        ResponseTemplate::new(200).set_body_json(Value::Array(rows))
    }
}

#[tokio::test]
async fn test_headers_with_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/insert"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("User-Agent", "MCP-Context-Server/1.0.0"))
        .and(header("Content-Type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "id": "ctx-1", "message": "ok"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("test-key"), 5_000);
    let result = client
        .insert_context(&InsertContextRequest::new("hello"))
        .await;

    assert!(result.is_ok(), "Request should succeed: {:?}", result.err());
    assert_eq!(result.unwrap().id.as_deref(), Some("ctx-1"));
}

#[tokio::test]
async fn test_no_authorization_header_without_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let result = client
        .search_context(&SearchContextRequest::new("anything"))
        .await;

    assert!(result.is_ok(), "Request should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_insert_sends_default_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/insert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "n1"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let before = chrono::Utc::now();
    let response = client
        .insert_context(&InsertContextRequest::new("x"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.id.as_deref(), Some("n1"));
    assert_eq!(response.message, "Context inserted successfully");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["content"], json!("x"));

    let meta = body["metadata"].as_object().unwrap();
    assert_eq!(meta.len(), 4);
    assert_eq!(meta["context"], json!("user_data"));
    assert_eq!(meta["tags"], json!([]));
    assert_eq!(meta["client"], json!("mcp-server"));

    let stamped = chrono::DateTime::parse_from_rfc3339(meta["timestamp"].as_str().unwrap())
        .unwrap()
        .with_timezone(&chrono::Utc);
    let drift = (stamped - before).num_seconds().abs();
    assert!(drift <= 5, "timestamp should be near call time, drift {}s", drift);
}

#[tokio::test]
async fn test_insert_metadata_overrides() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/insert"))
        .and(body_partial_json(json!({
            "metadata": {
                "context": "project_notes",
                "tags": ["rust"],
                "timestamp": "2025-01-01T00:00:00Z",
                "client": "mcp-server"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "stored"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let request = InsertContextRequest::new("x").with_metadata(InsertMetadata {
        context: Some("project_notes".to_string()),
        tags: Some(vec!["rust".to_string()]),
        timestamp: Some("2025-01-01T00:00:00Z".to_string()),
        ..Default::default()
    });

    let response = client.insert_context(&request).await.unwrap();
    assert_eq!(response.message, "stored");
}

#[tokio::test]
async fn test_search_sends_k_and_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "query": "deploy",
            "k": 5,
            "filters": {"tags": ["ops"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let request = SearchContextRequest::new("deploy").with_filters(SearchFilters {
        tags: Some(vec!["ops".to_string()]),
        ..Default::default()
    });

    let response = client.search_context(&request).await.unwrap();
    assert!(response.success);
    assert_eq!(response.total, Some(0));
}

#[tokio::test]
async fn test_search_bare_array_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "content": "alpha", "distance": 0.25},
            {"id": 2, "content": "beta", "distance": 0.5},
            {"id": 3, "content": "gamma", "distance": 1.0}
        ])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let response = client
        .search_context(&SearchContextRequest::new("letters"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.total, Some(3));
    for item in &response.results {
        let distance = item.distance.unwrap();
        let score = item.relevance_score.unwrap();
        assert!((score - (1.0 - distance)).abs() < 1e-9);
    }
    assert_eq!(response.results[0].id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_search_unrecognized_shape_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"foo": "bar"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let response = client
        .search_context(&SearchContextRequest::new("q"))
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.results.is_empty());
    assert_eq!(response.total, Some(0));
}

#[tokio::test]
async fn test_http_500_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/insert"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"success": true})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);

    let err = client
        .insert_context(&InsertContextRequest::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(err.to_string().contains("500"), "{}", err);
    assert!(err.to_string().starts_with("Insert context failed"));

    let err = client
        .search_context(&SearchContextRequest::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(
        err.to_string(),
        "Search context failed: HTTP 500: Internal Server Error"
    );
}

#[tokio::test]
async fn test_timeout_is_classified_and_bounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 50);

    let start = Instant::now();
    let err = client
        .insert_context(&InsertContextRequest::new("x"))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(
        err.to_string(),
        "Request timeout - insert operation took too long"
    );
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(1_000), "took {:?}", elapsed);

    let start = Instant::now();
    let err = client
        .search_context(&SearchContextRequest::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(start.elapsed() < Duration::from_millis(1_000));
}

#[tokio::test]
async fn test_invalid_json_body_is_unknown_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/insert"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None, 5_000);
    let err = client
        .insert_context(&InsertContextRequest::new("x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(err.to_string().starts_with("Insert context failed: "));
}

#[tokio::test]
async fn test_connection_refused_is_unknown_error() {
    // Bind and release a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ContextConfig::new(
        &format!("http://127.0.0.1:{}/insert", port),
        &format!("http://127.0.0.1:{}/search", port),
        None,
        5_000,
    )
    .unwrap();
    let client = ContextApiClient::new(config).unwrap();

    let err = client
        .search_context(&SearchContextRequest::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(err.to_string().starts_with("Search context failed: "));
}

#[tokio::test]
async fn test_insert_then_search_round_trip() {
    let mock_server = MockServer::start().await;
    let store = EchoStore::default();

    Mock::given(method("POST"))
        .and(path("/insert"))
        .respond_with(EchoInsert(store.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(EchoSearch(store.clone()))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("k"), 5_000);

    let inserted = client
        .insert_context(&InsertContextRequest::new("x"))
        .await
        .unwrap();
    assert!(inserted.success);
    assert_eq!(inserted.id.as_deref(), Some("1"));

    let found = client
        .search_context(&SearchContextRequest::new("x"))
        .await
        .unwrap();
    assert!(found.success);
    assert_eq!(found.results.len(), 1);
    assert_eq!(found.results[0].content, "x");
    assert!((found.results[0].relevance_score.unwrap() - 0.9).abs() < 1e-9);
}
