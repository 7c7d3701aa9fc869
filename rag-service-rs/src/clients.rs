//! Shared backend clients
//!
//! The registry is created once at startup and shared behind an `Arc`. Each
//! client is built on first use (or by [`ClientRegistry::warm_up`]) and then
//! reused for the life of the process. Building a client does no network I/O.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tool_sdk::config::{AzureOpenAIConfig, SearchConfig};
use tool_sdk::error::mapping::AZURE_OPENAI_SERVICE;
use tool_sdk::error::Result;
use tool_sdk::openai::{AzureOpenAIClient, ChatCompletionRequest, ChatCompletionResponse};
use tool_sdk::search::AzureSearchStore;
use tool_sdk::{ChatCompletions, Embeddings, Passage, VectorSearch};

#[derive(Debug)]
pub struct ClientRegistry {
    openai_config: AzureOpenAIConfig,
    search_config: SearchConfig,
    openai: OnceCell<Arc<AzureOpenAIClient>>,
    vector_store: OnceCell<Arc<AzureSearchStore>>,
}

impl ClientRegistry {
    pub fn new(openai_config: AzureOpenAIConfig, search_config: SearchConfig) -> Self {
        Self {
            openai_config,
            search_config,
            openai: OnceCell::new(),
            vector_store: OnceCell::new(),
        }
    }

    /// The Azure OpenAI client, built on first call
    pub fn openai(&self) -> Result<Arc<AzureOpenAIClient>> {
        self.openai
            .get_or_try_init(|| {
                tracing::info!(deployment = %self.openai_config.chat_deployment, "Creating Azure OpenAI client");
                AzureOpenAIClient::new(self.openai_config.clone()).map(Arc::new)
            })
            .cloned()
    }

    /// The Azure AI Search store, built on first call; embeds queries with
    /// the shared OpenAI client
    pub fn vector_store(&self) -> Result<Arc<AzureSearchStore>> {
        self.vector_store
            .get_or_try_init(|| {
                let embeddings: Arc<dyn Embeddings> = self.openai()?;
                tracing::info!(index = %self.search_config.index_name, "Creating Azure AI Search store");
                AzureSearchStore::new(self.search_config.clone(), embeddings).map(Arc::new)
            })
            .cloned()
    }

    /// Build every client now instead of on the first request
    pub fn warm_up(&self) -> Result<()> {
        self.openai()?;
        self.vector_store()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.openai.get().is_some() && self.vector_store.get().is_some()
    }
}

#[async_trait]
impl ChatCompletions for ClientRegistry {
    fn provider(&self) -> &str {
        AZURE_OPENAI_SERVICE
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<ChatCompletionResponse> {
        self.openai()?.create_chat_completion(request, timeout).await
    }
}

#[async_trait]
impl VectorSearch for ClientRegistry {
    async fn similarity_search_with_relevance_scores(&self, query: &str, k: usize) -> Result<Vec<(Passage, f32)>> {
        self.vector_store()?
            .similarity_search_with_relevance_scores(query, k)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ClientRegistry {
        let openai = AzureOpenAIConfig {
            api_base: "https://res.openai.azure.com".to_string(),
            api_key: "k".to_string(),
            chat_deployment: "gpt-4o".to_string(),
            embedding_deployment: "embed".to_string(),
            ..AzureOpenAIConfig::default()
        };

        let search = SearchConfig {
            endpoint: "https://search.search.windows.net".to_string(),
            api_key: "s".to_string(),
            index_name: "docs".to_string(),
            ..SearchConfig::default()
        };

        ClientRegistry::new(openai, search)
    }

    #[test]
    fn test_clients_are_lazy() {
        let registry = registry();
        assert!(!registry.is_initialized());

        registry.warm_up().unwrap();
        assert!(registry.is_initialized());
    }

    #[test]
    fn test_clients_are_built_once() {
        let registry = registry();

        let first = registry.openai().unwrap();
        let second = registry.openai().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let store_a = registry.vector_store().unwrap();
        let store_b = registry.vector_store().unwrap();
        assert!(Arc::ptr_eq(&store_a, &store_b));
    }
}
