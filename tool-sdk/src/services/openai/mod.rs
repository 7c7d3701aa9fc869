//! Azure OpenAI API client implementation
//!
//! This module provides a strongly-typed client for an Azure OpenAI
//! resource, with support for chat completions and embeddings. Requests are
//! addressed by deployment:
//!
//! `POST {base}/openai/deployments/{deployment}/{operation}?api-version={version}`

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{AzureOpenAIConfig, ConfigProvider, DEFAULT_PROVIDER};
use crate::core::{ChatCompletions, Embeddings};
use crate::error::mapping::AZURE_OPENAI_SERVICE;
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, parse_error_response, read_json, UserAgent};

/// Azure OpenAI API client
#[derive(Debug, Clone)]
pub struct AzureOpenAIClient {
    http_client: Client,
    config: AzureOpenAIConfig,
}

impl AzureOpenAIClient {
    /// Create a client from explicit configuration. Performs no I/O.
    pub fn new(config: AzureOpenAIConfig) -> Result<Self> {
        let http_client = build_http_client(
            Some(UserAgent::for_component("azure-openai-client")),
            Some(Duration::from_secs_f64(config.timeout_seconds)),
        )?;

        Ok(Self { http_client, config })
    }

    /// Create a client from the process environment
    pub fn from_env() -> Result<Self> {
        Self::new(AzureOpenAIConfig::from_provider(&**DEFAULT_PROVIDER)?)
    }

    /// Create a client from any configuration provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Self::new(AzureOpenAIConfig::from_provider(provider)?)
    }

    /// Create a new builder for the client
    pub fn builder() -> AzureOpenAIClientBuilder {
        AzureOpenAIClientBuilder::default()
    }

    pub fn config(&self) -> &AzureOpenAIConfig {
        &self.config
    }

    /// Full URL for an operation on a deployment
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.config.base_url(),
            deployment,
            operation,
            self.config.api_version
        )
    }

    /// Send a chat completion request
    ///
    /// `request.model` picks the deployment; when empty the configured chat
    /// deployment is used. `timeout` overrides the client default.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<ChatCompletionResponse> {
        let deployment = if request.model.is_empty() {
            self.config.chat_deployment.as_str()
        } else {
            request.model.as_str()
        };
        let url = self.deployment_url(deployment, "chat/completions");
        self.post_json(&url, request, timeout).await
    }

    /// Send a text embedding request
    pub async fn embeddings(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        let deployment = if request.model.is_empty() {
            self.config.embedding_deployment.as_str()
        } else {
            request.model.as_str()
        };
        let url = self.deployment_url(deployment, "embeddings");
        self.post_json(&url, request, None).await
    }

    /// Generate the embedding for one text with the configured deployment
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: String::new(),
            input: vec![text.to_string()],
        };

        let response = self.embeddings(&request).await?;
        response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| ServiceError::parsing("No embeddings returned"))
    }

    async fn post_json<T, R>(&self, url: &str, body: &T, timeout: Option<Duration>) -> Result<R>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!("Sending request to Azure OpenAI: POST {}", url);

        let mut builder = self
            .http_client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(body);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        if response.status().is_success() {
            read_json(AZURE_OPENAI_SERVICE, response).await
        } else {
            Err(parse_error_response(AZURE_OPENAI_SERVICE, response).await)
        }
    }
}

#[async_trait]
impl ChatCompletions for AzureOpenAIClient {
    fn provider(&self) -> &str {
        AZURE_OPENAI_SERVICE
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<ChatCompletionResponse> {
        self.chat_completion(request, Some(timeout)).await
    }
}

#[async_trait]
impl Embeddings for AzureOpenAIClient {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text).await
    }
}

/// Builder for the Azure OpenAI client
#[derive(Debug, Default)]
pub struct AzureOpenAIClientBuilder {
    api_base: Option<String>,
    api_key: Option<String>,
    api_version: Option<String>,
    chat_deployment: Option<String>,
    embedding_deployment: Option<String>,
    timeout_seconds: Option<f64>,
}

impl AzureOpenAIClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource endpoint
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn chat_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.chat_deployment = Some(deployment.into());
        self
    }

    pub fn embedding_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.embedding_deployment = Some(deployment.into());
        self
    }

    /// Set the default timeout in seconds
    pub fn timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the client, validating the assembled configuration
    pub fn build(self) -> Result<AzureOpenAIClient> {
        use crate::config::ServiceConfig;

        let defaults = AzureOpenAIConfig::default();
        let config = AzureOpenAIConfig {
            api_base: self.api_base.unwrap_or_default(),
            api_key: self.api_key.unwrap_or_default(),
            api_version: self.api_version.unwrap_or(defaults.api_version),
            chat_deployment: self.chat_deployment.unwrap_or_default(),
            embedding_deployment: self.embedding_deployment.unwrap_or_default(),
            timeout_seconds: self.timeout_seconds.unwrap_or(defaults.timeout_seconds),
        };

        config.validate()?;
        AzureOpenAIClient::new(config)
    }
}
