//! Answer generation
//!
//! Builds the grounding prompt, calls the chat backend under the retry
//! policy and flattens whatever content shape comes back into plain text.
//! Backend failures are classified into [`GenerationError`]; only the
//! transient categories are retried.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tool_sdk::openai::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use tool_sdk::{ChatCompletions, RetryConfig, RetryExecutor, ServiceError};

use crate::instrumentation::{CallTimer, MetricsSink, Pricing};

pub const SYSTEM_PROMPT: &str = "Answer using only the provided context.";

/// Stands in for the context block when retrieval found nothing
pub const NO_CONTEXT_PLACEHOLDER: &str = "(no context found)";

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Classified failure of a generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Rate limited by model provider")]
    RateLimited,

    #[error("LLM timeout")]
    TimedOut,

    #[error("LLM upstream error: {0}")]
    Upstream(String),

    #[error("LLM error: {0}")]
    Other(ServiceError),
}

impl GenerationError {
    /// Sort a backend error into a generation category
    pub fn classify(error: ServiceError) -> Self {
        match error.root() {
            ServiceError::RateLimit(_) => GenerationError::RateLimited,
            ServiceError::Timeout(_) => GenerationError::TimedOut,
            ServiceError::Service(_) | ServiceError::ExternalService(_) | ServiceError::Network(_) => {
                GenerationError::Upstream(error.message().to_string())
            }
            _ => GenerationError::Other(error),
        }
    }

    /// Worth another attempt
    pub fn is_transient(&self) -> bool {
        !matches!(self, GenerationError::Other(_))
    }

    /// Value of the `error_type` metric label
    pub fn metric_label(&self) -> &'static str {
        match self {
            GenerationError::RateLimited => "rate_limited",
            GenerationError::TimedOut => "timeout",
            GenerationError::Upstream(_) => "upstream",
            GenerationError::Other(err) => err.category(),
        }
    }
}

/// The two grounding messages for a query, system first
pub fn build_prompt(query: &str, context: &str) -> Vec<ChatMessage> {
    let context = if context.is_empty() { NO_CONTEXT_PLACEHOLDER } else { context };

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "You are a helpful RAG assistant. Use ONLY the provided context. \
             If the answer is not in the context, say you don't know.\n\n\
             CONTEXT:\n{}\n\nQUESTION: {}",
            context, query
        )),
    ]
}

/// Plain text of the first choice; empty when there is nothing usable
pub fn normalize_content(response: Option<&ChatCompletionResponse>) -> String {
    response.map(|r| r.first_content().to_text()).unwrap_or_default()
}

/// Generation parameters
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Chat deployment, also the `model` metric label
    pub deployment: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// Bound on each attempt
    pub timeout: Duration,

    pub retry: RetryConfig,
    pub pricing: Pricing,
}

impl GeneratorConfig {
    pub fn new(deployment: impl Into<String>, timeout: Duration) -> Self {
        Self {
            deployment: deployment.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout,
            retry: RetryConfig::default(),
            pricing: Pricing::default(),
        }
    }
}

/// Produces answers from a chat backend
pub struct AnswerGenerator {
    chat: Arc<dyn ChatCompletions>,
    metrics: Arc<dyn MetricsSink>,
    retry: RetryExecutor,
    config: GeneratorConfig,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatCompletions>, metrics: Arc<dyn MetricsSink>, config: GeneratorConfig) -> Self {
        Self {
            retry: RetryExecutor::new(config.retry.clone()),
            chat,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Answer `query` from `context`
    ///
    /// Transient failures are retried per the configured policy; the error of
    /// the last attempt is returned once attempts run out. One call, with
    /// all its retries, is instrumented as a single scope.
    pub async fn answer(&self, query: &str, context: &str) -> Result<String, GenerationError> {
        let request = ChatCompletionRequest {
            model: self.config.deployment.clone(),
            messages: build_prompt(query, context),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        };

        let timer = CallTimer::start(
            self.metrics.clone(),
            self.chat.provider(),
            self.config.deployment.as_str(),
            self.config.pricing,
        );

        let outcome = self
            .retry
            .execute_when(|| self.attempt(&request), GenerationError::is_transient)
            .await;

        match outcome {
            Ok(response) => {
                timer.record_success(response.token_usage());
                Ok(normalize_content(Some(&response)))
            }
            Err(err) => {
                timer.record_error(err.metric_label());
                Err(err)
            }
        }
    }

    async fn attempt(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, GenerationError> {
        let call = self.chat.create_chat_completion(request, self.config.timeout);

        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(result) => result.map_err(GenerationError::classify),
            Err(_) => Err(GenerationError::TimedOut),
        }
    }
}
