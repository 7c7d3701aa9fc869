//! Azure AI Search vector store
//!
//! Embeds the query through an [`Embeddings`] backend and runs a pure
//! vector query against one index. Hits come back in the order the service
//! ranks them.

mod models;
pub use models::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::config::{ConfigProvider, SearchConfig};
use crate::core::{Embeddings, Passage, VectorSearch};
use crate::error::mapping::AZURE_SEARCH_SERVICE;
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, parse_error_response, read_json, UserAgent};

/// Vector store backed by an Azure AI Search index
pub struct AzureSearchStore {
    http_client: Client,
    config: SearchConfig,
    embeddings: Arc<dyn Embeddings>,
}

impl std::fmt::Debug for AzureSearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSearchStore")
            .field("endpoint", &self.config.endpoint)
            .field("index_name", &self.config.index_name)
            .finish()
    }
}

impl AzureSearchStore {
    /// Create a store from explicit configuration. Performs no I/O.
    pub fn new(config: SearchConfig, embeddings: Arc<dyn Embeddings>) -> Result<Self> {
        let http_client = build_http_client(
            Some(UserAgent::for_component("azure-search-client")),
            Some(Duration::from_secs_f64(config.timeout_seconds)),
        )?;

        Ok(Self {
            http_client,
            config,
            embeddings,
        })
    }

    /// Create a store from any configuration provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P, embeddings: Arc<dyn Embeddings>) -> Result<Self> {
        Self::new(SearchConfig::from_provider(provider)?, embeddings)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!("{}/indexes/{}/docs/search", self.config.base_url(), self.config.index_name)
    }

    /// Run a raw vector query
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.search_url();
        debug!("Sending request to Azure AI Search: POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            read_json(AZURE_SEARCH_SERVICE, response).await
        } else {
            Err(parse_error_response(AZURE_SEARCH_SERVICE, response).await)
        }
    }

    /// Turn a search hit into a passage, splitting text from metadata
    fn to_passage(&self, document: SearchDocument) -> (Passage, f32) {
        let mut fields = document.fields;
        let content = match fields.remove(&self.config.content_field) {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };

        fields.remove(&self.config.vector_field);
        fields.retain(|key, _| !key.starts_with("@search."));

        (Passage { content, metadata: fields }, document.score)
    }
}

#[async_trait]
impl VectorSearch for AzureSearchStore {
    async fn similarity_search_with_relevance_scores(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Passage, f32)>> {
        if k == 0 {
            return Err(ServiceError::validation("k must be at least 1"));
        }

        let vector = self.embeddings.embed_query(query).await?;

        let request = SearchRequest {
            vector_queries: vec![VectorQuery {
                kind: "vector".to_string(),
                vector,
                fields: self.config.vector_field.clone(),
                k,
            }],
            top: k,
        };

        let response = self.search(&request).await?;
        debug!("Azure AI Search returned {} hit(s)", response.value.len());

        Ok(response
            .value
            .into_iter()
            .take(k)
            .map(|doc| self.to_passage(doc))
            .collect())
    }
}
