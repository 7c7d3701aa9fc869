//! The full pipeline over the real Azure clients, with WireMock standing in
//! for both services

use std::sync::Arc;

use rag_service::clients::ClientRegistry;
use rag_service::{AskError, InMemorySink, RagPipeline, Settings};
use serde_json::json;
use tool_sdk::config::MemoryConfigProvider;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/openai/deployments/gpt-4o/chat/completions";
const EMBEDDINGS_PATH: &str = "/openai/deployments/embed/embeddings";
const SEARCH_PATH: &str = "/indexes/docs/docs/search";

fn settings(server: &MockServer) -> Settings {
    let mut provider = MemoryConfigProvider::new();
    provider.set("openai_api_base", &server.uri());
    provider.set("openai_api_key", "oai-key");
    provider.set("chat_deployment", "gpt-4o");
    provider.set("embedding_deployment", "embed");
    provider.set("search_service_name", &server.uri());
    provider.set("search_api_key", "search-key");
    provider.set("search_index_name", "docs");
    provider.set("top_k", "2");
    provider.set("llm_timeout", "5");
    Settings::from_provider(&provider).unwrap()
}

fn pipeline(settings: &Settings) -> (RagPipeline, Arc<ClientRegistry>) {
    let clients = Arc::new(ClientRegistry::new(settings.openai.clone(), settings.search.clone()));
    let pipeline = RagPipeline::from_settings(settings, clients.clone(), clients.clone(), Arc::new(InMemorySink::new()));
    (pipeline, clients)
}

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(EMBEDDINGS_PATH))
        .and(header("api-key", "oai-key"))
        .and(body_partial_json(json!({"input": ["capital of France?"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ask_through_azure_clients() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(query_param("api-version", "2023-11-01"))
        .and(header("api-key", "search-key"))
        .and(body_partial_json(json!({
            "top": 2,
            "vectorQueries": [{"kind": "vector", "fields": "content_vector", "k": 2}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"@search.score": 0.92, "content": "Paris is the capital of France.", "source": "geo.md"},
                {"@search.score": 0.41, "content": "France is in Europe."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(query_param("api-version", "2024-06-01"))
        .and(body_string_contains("Paris is the capital of France.\\n\\n---\\n\\nFrance is in Europe."))
        .and(body_partial_json(json!({"temperature": 0.2, "max_tokens": 800})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Paris."}}],
            "usage": {"prompt_tokens": 80, "completion_tokens": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (pipeline, clients) = pipeline(&settings(&server));
    assert!(!clients.is_initialized());

    let envelope = pipeline.ask("capital of France?", "trace-backend-1").await.unwrap();

    assert_eq!(envelope.response, "Paris.");
    assert!(clients.is_initialized());
}

#[tokio::test]
async fn test_search_outage_surfaces_as_search_failure() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": "ServiceUnavailable", "message": "Service is temporarily unavailable"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (pipeline, _) = pipeline(&settings(&server));

    let err = pipeline.ask("capital of France?", "trace-backend-1").await.unwrap_err();

    assert!(matches!(err, AskError::SearchFailure(_)));
    assert_eq!(err.status_code(), 502);
}
