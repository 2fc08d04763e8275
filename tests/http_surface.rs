//! End-to-end tests over the HTTP router with mocked provider endpoints.
//!
//! Each test runs a real `RetrievalService` against its own `httpmock` server,
//! so the full pipeline (corpus file, chunking, embedding calls, planning,
//! ranking, serialization) is exercised without any live provider.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use httpmock::{Method::POST, MockServer};
use serde_json::json;
use tower::ServiceExt;

use finkb::api::create_router;
use finkb::corpus::JsonFileCorpus;
use finkb::embedding::OpenAiEmbeddingClient;
use finkb::generation::OpenAiChatClient;
use finkb::retrieval::{RetrievalService, RetrievalSettings};

fn router_for(server: &MockServer) -> Router {
    let service = RetrievalService::new(
        Box::new(JsonFileCorpus::new("tests/fixtures/corpus.json")),
        Box::new(OpenAiEmbeddingClient::new(
            server.base_url(),
            None,
            "test-embed".into(),
        )),
        Box::new(OpenAiChatClient::new(
            server.base_url(),
            None,
            "test-chat".into(),
        )),
        RetrievalSettings::default(),
    );
    create_router(Arc::new(service))
}

/// The build batch carries both chunk texts, so it is the only embeddings
/// request containing the first document's opening words.
async fn mock_build_embeddings(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .body_contains("An emergency fund covers");
            then.status(200).json_body(json!({
                "data": [
                    { "index": 0, "embedding": [1.0, 0.0] },
                    { "index": 1, "embedding": [0.0, 1.0] }
                ]
            }));
        })
        .await;
}

/// Answer single-query embedding requests containing `phrase` with `vector`.
async fn mock_query_embedding(server: &MockServer, phrase: &str, vector: [f64; 2]) {
    let phrase = phrase.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST).path("/embeddings").body_contains(phrase);
            then.status(200).json_body(json!({
                "data": [
                    { "index": 0, "embedding": vector }
                ]
            }));
        })
        .await;
}

async fn mock_plan(server: &MockServer, plan: serde_json::Value) {
    let content = plan.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "content": content } }
                ]
            }));
        })
        .await;
}

fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}

#[tokio::test]
async fn init_status_search_flow() {
    let server = MockServer::start_async().await;
    mock_build_embeddings(&server).await;
    mock_query_embedding(&server, "cash cushion", [1.0, 0.0]).await;
    let app = router_for(&server);

    let response = app
        .clone()
        .oneshot(empty_request(Method::POST, "/api/kb/init"))
        .await
        .expect("init response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["documents"], 2);
    assert_eq!(body["chunks"], 2);

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/api/kb/status"))
        .await
        .expect("status response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["documents"], 2);
    assert_eq!(body["chunks"], 2);
    assert!(body["builtAt"].is_string());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/kb/search",
            json!({ "query": "cash cushion", "topK": 1 }),
        ))
        .await
        .expect("search response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "emergency-fund_1");
    assert_eq!(results[0]["title"], "Emergency funds");
    assert_eq!(results[0]["score"], 1.0);
    assert!(results[0].get("tags").is_none());

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/metrics"))
        .await
        .expect("metrics response");
    let body = read_json(response).await;
    assert_eq!(body["buildsCompleted"], 1);
    assert_eq!(body["searchesServed"], 1);
}

#[tokio::test]
async fn search_before_init_is_rejected() {
    let server = MockServer::start_async().await;
    let app = router_for(&server);

    let response = app
        .oneshot(post_json("/api/kb/search", json!({ "query": "cash cushion" })))
        .await
        .expect("search response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("not ready")
    );
}

#[tokio::test]
async fn advanced_search_applies_plan_filters() {
    let server = MockServer::start_async().await;
    mock_build_embeddings(&server).await;
    mock_query_embedding(&server, "cash cushion", [1.0, 0.0]).await;
    mock_plan(
        &server,
        json!({
            "language": "Spanish",
            "translatedQuery": "cash cushion",
            "filters": { "tags": ["emergency-fund"] }
        }),
    )
    .await;
    let app = router_for(&server);

    let response = app
        .clone()
        .oneshot(empty_request(Method::POST, "/api/kb/init"))
        .await
        .expect("init response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/kb/advanced",
            json!({ "query": "colchón de efectivo" }),
        ))
        .await
        .expect("advanced response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["query"], "colchón de efectivo");
    assert_eq!(body["translation"]["language"], "Spanish");
    assert_eq!(body["translation"]["translatedQuery"], "cash cushion");
    assert_eq!(body["translation"]["usedFallback"], false);
    assert_eq!(body["translation"]["filters"]["tags"][0], "emergency-fund");

    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "emergency-fund_1");
    assert_eq!(results[0]["tags"][0], "emergency-fund");
}

#[tokio::test]
async fn advanced_search_falls_back_when_filters_match_nothing() {
    let server = MockServer::start_async().await;
    mock_build_embeddings(&server).await;
    mock_query_embedding(&server, "cash cushion", [1.0, 0.0]).await;
    mock_plan(
        &server,
        json!({
            "translatedQuery": "cash cushion",
            "filters": { "tags": ["insurance"] }
        }),
    )
    .await;
    let app = router_for(&server);

    let response = app
        .clone()
        .oneshot(empty_request(Method::POST, "/api/kb/init"))
        .await
        .expect("init response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json("/api/kb/advanced", json!({ "query": "cash cushion" })))
        .await
        .expect("advanced response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["translation"]["usedFallback"], true);
    assert!(body["translation"]["language"].is_null());
    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "emergency-fund_1");
}

#[tokio::test]
async fn embedding_outage_fails_the_build() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(500).body("boom");
        })
        .await;
    let app = router_for(&server);

    let response = app
        .oneshot(empty_request(Method::POST, "/api/kb/init"))
        .await
        .expect("init response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert!(body["error"].is_string());
}
