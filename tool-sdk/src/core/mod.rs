//! Core abstractions for the Tool SDK
//!
//! The RAG pipeline talks to its backends only through these traits:
//!
//! - `ChatCompletions`: one chat-completion call with a per-request timeout
//! - `Embeddings`: turns a query string into a vector
//! - `VectorSearch`: top-k similarity search returning scored passages
//!
//! Concrete clients live under [`crate::services`]; tests substitute stubs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::services::openai::{ChatCompletionRequest, ChatCompletionResponse};

/// A chat-completion backend
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    /// Backend identifier used in metric labels
    fn provider(&self) -> &str {
        "azure_openai"
    }

    /// Send one chat-completion request, failing with `ServiceError::Timeout`
    /// if no response arrives within `timeout`
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<ChatCompletionResponse>;
}

/// A text-embedding backend
#[async_trait]
pub trait Embeddings: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

/// A stored text passage returned by a vector search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text; absent when the index document has no content field
    pub content: Option<String>,

    /// Remaining document fields
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            metadata: HashMap::new(),
        }
    }

    /// Text of the passage, `None` if missing or empty
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// A vector store that can rank passages against a query
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return at most `k` passages with relevance scores, most relevant first
    async fn similarity_search_with_relevance_scores(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Passage, f32)>>;
}
