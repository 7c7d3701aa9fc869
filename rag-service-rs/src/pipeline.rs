//! The ask pipeline: retrieve context, then generate an answer
//!
//! Each failure leaves the pipeline as exactly one [`AskError`]. There is
//! never a partial envelope and no retrying happens at this level.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tool_sdk::util::generate_request_id;
use tool_sdk::{ChatCompletions, VectorSearch};

use crate::generator::{AnswerGenerator, GenerationError, GeneratorConfig};
use crate::instrumentation::MetricsSink;
use crate::retriever::ContextRetriever;
use crate::settings::Settings;

/// Successful answer to one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    pub response: String,

    /// Fresh UUID v4 per request
    pub request_id: String,
}

/// Externally visible failure of an ask
#[derive(Debug, Error)]
pub enum AskError {
    #[error("Search error: {0}")]
    SearchFailure(String),

    #[error("Rate limited by model provider")]
    RateLimited,

    #[error("LLM timeout")]
    TimedOut,

    #[error("LLM upstream error: {0}")]
    UpstreamError(String),

    /// Details are logged, never returned
    #[error("LLM error")]
    InternalError,
}

impl AskError {
    pub fn status_code(&self) -> u16 {
        match self {
            AskError::SearchFailure(_) => 502,
            AskError::RateLimited => 429,
            AskError::TimedOut => 504,
            AskError::UpstreamError(_) => 502,
            AskError::InternalError => 500,
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            AskError::SearchFailure(_) => "search_failure",
            AskError::RateLimited => "rate_limited",
            AskError::TimedOut => "timed_out",
            AskError::UpstreamError(_) => "upstream_error",
            AskError::InternalError => "internal_error",
        }
    }
}

pub struct RagPipeline {
    retriever: ContextRetriever,
    generator: AnswerGenerator,
}

impl RagPipeline {
    pub fn new(retriever: ContextRetriever, generator: AnswerGenerator) -> Self {
        Self { retriever, generator }
    }

    /// Wire a pipeline from settings and the given backends
    pub fn from_settings(
        settings: &Settings,
        chat: Arc<dyn ChatCompletions>,
        store: Arc<dyn VectorSearch>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let mut config = GeneratorConfig::new(settings.openai.chat_deployment.clone(), settings.llm_timeout);
        config.pricing = settings.pricing;

        Self::new(
            ContextRetriever::new(store, settings.top_k),
            AnswerGenerator::new(chat, metrics, config),
        )
    }

    /// Answer one query
    ///
    /// `correlation_id` is the caller's trace id and tags every failure log
    /// line. The envelope always carries a freshly minted id.
    pub async fn ask(&self, query: &str, correlation_id: &str) -> Result<AnswerEnvelope, AskError> {
        let context = match self.retriever.retrieve(query).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(request_id = %correlation_id, error = %e, "Context retrieval failed");
                return Err(AskError::SearchFailure(e.to_string()));
            }
        };

        let response = match self.generator.answer(query, &context).await {
            Ok(text) => text,
            Err(GenerationError::RateLimited) => return Err(AskError::RateLimited),
            Err(GenerationError::TimedOut) => return Err(AskError::TimedOut),
            Err(GenerationError::Upstream(message)) => {
                tracing::warn!(request_id = %correlation_id, error = %message, "Model upstream error");
                return Err(AskError::UpstreamError(message));
            }
            Err(GenerationError::Other(e)) => {
                tracing::error!(
                    request_id = %correlation_id,
                    category = e.category(),
                    error = %e,
                    "Answer generation failed"
                );
                return Err(AskError::InternalError);
            }
        };

        Ok(AnswerEnvelope {
            response,
            request_id: generate_request_id(),
        })
    }
}
