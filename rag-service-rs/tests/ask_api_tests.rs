//! End-to-end tests of POST /ask against stub backends

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use rag_service::instrumentation::{LLM_ERRORS_TOTAL, LLM_REQUESTS_TOTAL, LLM_REQUEST_SECONDS};
use tool_sdk::openai::ChatCompletionResponse;
use tool_sdk::ServiceError;
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn test_ask_returns_answer_with_request_id() {
    let app = test_app(StubChat::answering("final-answer"), StubStore::with_passages(vec!["doc one"]));

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["response"], "final-answer");

    let request_id = body["request_id"].as_str().unwrap();
    let parsed = uuid::Uuid::parse_str(request_id).unwrap();
    assert_eq!(parsed.get_version_num(), 4);

    assert_eq!(app.store.calls(), 1);
    assert_eq!(app.chat.calls(), 1);
    assert_eq!(
        app.sink.counter(
            LLM_REQUESTS_TOTAL,
            &[("provider", "azure_openai"), ("model", DEPLOYMENT), ("status", "success")]
        ),
        1
    );
    assert_eq!(app.sink.observations(LLM_REQUEST_SECONDS).len(), 1);
}

#[tokio::test]
async fn test_each_request_gets_a_fresh_id() {
    let app = test_app(StubChat::answering("a"), StubStore::with_passages(vec![]));

    let first = body_json(app.router.clone().oneshot(ask_request("q")).await.unwrap()).await;
    let second = body_json(app.router.clone().oneshot(ask_request("q")).await.unwrap()).await;

    assert_ne!(first["request_id"], second["request_id"]);
}

#[tokio::test]
async fn test_search_failure_is_502_and_skips_generation() {
    let app = test_app(StubChat::answering("unused"), StubStore::failing("index offline"));

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Search error:"));
    assert!(body["detail"].as_str().unwrap().contains("index offline"));
    assert_eq!(app.chat.calls(), 0);
    assert_eq!(app.sink.counter_total(LLM_REQUESTS_TOTAL), 0);
}

#[tokio::test]
async fn test_persistent_rate_limit_is_429_after_three_attempts() {
    let app = test_app(
        StubChat::failing(|| ServiceError::rate_limit("Too many requests")),
        StubStore::with_passages(vec!["ctx"]),
    );

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["detail"], "Rate limited by model provider");
    assert_eq!(app.chat.calls(), 3);
    assert_eq!(
        app.sink.counter(
            LLM_ERRORS_TOTAL,
            &[("provider", "azure_openai"), ("model", DEPLOYMENT), ("error_type", "rate_limited")]
        ),
        1
    );
    assert_eq!(app.sink.observations(LLM_REQUEST_SECONDS).len(), 1);
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let chat = StubChat::new(|call| match call {
        0 => Err(ServiceError::service("503 from upstream")),
        1 => Err(ServiceError::timeout("read timed out")),
        _ => Ok(ChatCompletionResponse::from_text("recovered")),
    });
    let app = test_app(chat, StubStore::with_passages(vec!["ctx"]));

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["response"], "recovered");
    assert_eq!(app.chat.calls(), 3);
}

#[tokio::test]
async fn test_backend_timeout_is_504() {
    let app = test_app(
        StubChat::failing(|| ServiceError::timeout("deadline exceeded")),
        StubStore::with_passages(vec![]),
    );

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["detail"], "LLM timeout");
    assert_eq!(app.chat.calls(), 3);
}

#[tokio::test]
async fn test_slow_backend_hits_generation_timeout() {
    let chat = StubChat::answering("too late").with_delay(Duration::from_millis(500));
    let app = test_app_with_timeout(chat, StubStore::with_passages(vec![]), Duration::from_millis(20));

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(app.chat.calls(), 3);
}

#[tokio::test]
async fn test_upstream_error_is_502_with_message() {
    let app = test_app(
        StubChat::failing(|| ServiceError::service("The server had an error")),
        StubStore::with_passages(vec![]),
    );

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_json(response).await["detail"],
        "LLM upstream error: The server had an error"
    );
}

#[tokio::test]
async fn test_uncategorized_error_is_500_without_details() {
    let app = test_app(
        StubChat::failing(|| ServiceError::authentication("Access denied due to invalid subscription key")),
        StubStore::with_passages(vec![]),
    );

    let response = app.router.clone().oneshot(ask_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "LLM error");
    assert!(!body.to_string().contains("subscription key"));
    assert_eq!(app.chat.calls(), 1);
}

#[tokio::test]
async fn test_internal_error_log_carries_inbound_request_id() {
    let (logs, _guard) = CapturedLogs::install();
    let app = test_app(
        StubChat::failing(|| ServiceError::authentication("Access denied due to invalid subscription key")),
        StubStore::with_passages(vec!["ctx"]),
    );

    let response = app
        .router
        .clone()
        .oneshot(ask_request_with_id("hello", "client-abc-123"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-request-id"], "client-abc-123");

    let line = logs.line_with("Answer generation failed").unwrap();
    assert!(line.contains("ERROR"), "{}", line);
    assert!(line.contains("request_id=client-abc-123"), "{}", line);
    assert!(line.contains("authentication"), "{}", line);
}

#[tokio::test]
async fn test_search_failure_log_carries_inbound_request_id() {
    let (logs, _guard) = CapturedLogs::install();
    let app = test_app(StubChat::answering("unused"), StubStore::failing("index offline"));

    let response = app
        .router
        .clone()
        .oneshot(ask_request_with_id("hello", "client-search-7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let line = logs.line_with("Context retrieval failed").unwrap();
    assert!(line.contains("request_id=client-search-7"), "{}", line);
}

#[tokio::test]
async fn test_query_length_is_validated() {
    let app = test_app(StubChat::answering("unused"), StubStore::with_passages(vec![]));

    let empty = app.router.clone().oneshot(ask_request("")).await.unwrap();
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let too_long = app.router.clone().oneshot(ask_request(&"x".repeat(5001))).await.unwrap();
    assert_eq!(too_long.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let longest = app.router.clone().oneshot(ask_request(&"x".repeat(5000))).await.unwrap();
    assert_eq!(longest.status(), StatusCode::OK);

    assert_eq!(app.store.calls(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_422() {
    let app = test_app(StubChat::answering("unused"), StubStore::with_passages(vec![]));

    let response = app
        .router
        .clone()
        .oneshot(json_request("/ask", serde_json::json!({ "question": "wrong field" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["detail"].is_string());
    assert_eq!(app.store.calls(), 0);
}
