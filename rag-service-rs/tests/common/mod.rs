//! Shared fixtures for the service integration tests
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use rag_service::api::{self, AppState};
use rag_service::instrumentation::detached_prometheus_handle;
use rag_service::{AnswerGenerator, ContextRetriever, GeneratorConfig, InMemorySink, RagPipeline};
use serde_json::Value;
use tool_sdk::openai::{ChatCompletionRequest, ChatCompletionResponse};
use tool_sdk::{ChatCompletions, Passage, RetryConfig, ServiceError, VectorSearch};
use tracing_subscriber::fmt::MakeWriter;

pub const DEPLOYMENT: &str = "gpt-4o";

type ChatScript = Box<dyn Fn(usize) -> tool_sdk::Result<ChatCompletionResponse> + Send + Sync>;

/// Chat backend driven by a closure over the zero-based call index
pub struct StubChat {
    script: ChatScript,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubChat {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(usize) -> tool_sdk::Result<ChatCompletionResponse> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answering(text: &'static str) -> Self {
        Self::new(move |_| Ok(ChatCompletionResponse::from_text(text)))
    }

    pub fn failing<F>(error: F) -> Self
    where
        F: Fn() -> ServiceError + Send + Sync + 'static,
    {
        Self::new(move |_| Err(error()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletions for StubChat {
    async fn create_chat_completion(
        &self,
        _request: &ChatCompletionRequest,
        _timeout: Duration,
    ) -> tool_sdk::Result<ChatCompletionResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(call)
    }
}

/// Vector store returning fixed passages, or failing
pub struct StubStore {
    passages: Vec<&'static str>,
    failure: Option<&'static str>,
    calls: AtomicUsize,
}

impl StubStore {
    pub fn with_passages(passages: Vec<&'static str>) -> Self {
        Self {
            passages,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            passages: Vec::new(),
            failure: Some(message),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorSearch for StubStore {
    async fn similarity_search_with_relevance_scores(
        &self,
        _query: &str,
        k: usize,
    ) -> tool_sdk::Result<Vec<(Passage, f32)>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(message) => Err(ServiceError::service(message)),
            None => Ok(self
                .passages
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, text)| (Passage::new(*text), 1.0 - i as f32 * 0.1))
                .collect()),
        }
    }
}

/// Retry policy with the default attempt count but millisecond delays
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        initial_interval: Duration::from_millis(5),
        min_interval: Duration::from_millis(5),
        max_interval: Duration::from_millis(20),
        ..RetryConfig::default()
    }
}

pub fn generator_config(timeout: Duration) -> GeneratorConfig {
    let mut config = GeneratorConfig::new(DEPLOYMENT, timeout);
    config.retry = fast_retry();
    config
}

pub struct TestApp {
    pub router: Router,
    pub chat: Arc<StubChat>,
    pub store: Arc<StubStore>,
    pub sink: Arc<InMemorySink>,
}

pub fn test_app(chat: StubChat, store: StubStore) -> TestApp {
    test_app_with_timeout(chat, store, Duration::from_secs(5))
}

pub fn test_app_with_timeout(chat: StubChat, store: StubStore, timeout: Duration) -> TestApp {
    let chat = Arc::new(chat);
    let store = Arc::new(store);
    let sink = Arc::new(InMemorySink::new());

    let pipeline = RagPipeline::new(
        ContextRetriever::new(store.clone(), 5),
        AnswerGenerator::new(chat.clone(), sink.clone(), generator_config(timeout)),
    );
    let router = api::router(AppState::new(Arc::new(pipeline), detached_prometheus_handle()));

    TestApp {
        router,
        chat,
        store,
        sink,
    }
}

/// Log output captured from a thread-local subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route events on the current thread here until the guard drops
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// First captured line containing `message`
    pub fn line_with(&self, message: &str) -> Option<String> {
        self.contents().lines().find(|line| line.contains(message)).map(str::to_string)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub fn ask_request(query: &str) -> Request<Body> {
    json_request("/ask", serde_json::json!({ "query": query }))
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn ask_request_with_id(query: &str, request_id: &str) -> Request<Body> {
    let mut request = ask_request(query);
    request
        .headers_mut()
        .insert("x-request-id", request_id.parse().unwrap());
    request
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
