//! Configuration management for service clients
//!
//! This module provides utilities for loading and validating configuration
//! for the Azure OpenAI and Azure AI Search clients, with support for
//! environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ServiceError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Whether the key is present at all
    fn has(&self, key: &str) -> bool {
        self.get_string(key).is_ok()
    }

    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value.trim().parse::<f64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid float for key {}: {}", key, e)))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!("Invalid boolean value for key {}: {}", key, value))),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer, falling back to `default` only when the key is absent
    fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        if self.has(key) { self.get_int(key) } else { Ok(default) }
    }

    /// Get a float, falling back to `default` only when the key is absent
    fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.has(key) { self.get_float(key) } else { Ok(default) }
    }

    /// Get a boolean, falling back to `default` only when the key is absent
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        if self.has(key) { self.get_bool(key) } else { Ok(default) }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "OPENAI", "SEARCH")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        // Uppercase, non-alphanumerics become underscores
        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => {
                ServiceError::configuration(format!("Environment variable is not valid unicode: {}", env_key))
            }
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }

    /// Remove a configuration value
    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider (plain, unprefixed environment)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> = Lazy::new(|| Arc::new(EnvConfigProvider::new()));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

fn require<P: ConfigProvider + ?Sized>(provider: &P, key: &str) -> Result<String> {
    let value = provider.get_string(key)?;
    if value.trim().is_empty() {
        return Err(ServiceError::configuration(format!("{} must not be empty", key.to_uppercase())));
    }
    Ok(value.trim().to_string())
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value)
        .map_err(|e| ServiceError::configuration(format!("{} is not a valid URL: {}", name, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ServiceError::configuration(format!(
            "{} must use http or https, got {}",
            name, other
        ))),
    }
}

/// Connection settings for an Azure OpenAI resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub api_base: String,

    pub api_key: String,

    /// `api-version` query parameter
    pub api_version: String,

    /// Deployment used for chat completions
    pub chat_deployment: String,

    /// Deployment used for embeddings
    pub embedding_deployment: String,

    /// Default request timeout in seconds
    pub timeout_seconds: f64,
}

impl Default for AzureOpenAIConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            api_version: "2024-06-01".to_string(),
            chat_deployment: String::new(),
            embedding_deployment: String::new(),
            timeout_seconds: 30.0,
        }
    }
}

impl AzureOpenAIConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            api_base: require(provider, "openai_api_base")?,
            api_key: require(provider, "openai_api_key")?,
            api_version: provider.get_string_or("openai_api_version", "2024-06-01"),
            chat_deployment: require(provider, "chat_deployment")?,
            embedding_deployment: require(provider, "embedding_deployment")?,
            timeout_seconds: provider.get_float_or("llm_timeout", 30.0)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Endpoint without a trailing slash or `/openai` suffix
    pub fn base_url(&self) -> &str {
        let trimmed = self.api_base.trim_end_matches('/');
        trimmed.strip_suffix("/openai").unwrap_or(trimmed)
    }
}

impl ServiceConfig for AzureOpenAIConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::configuration("Azure OpenAI API key is required"));
        }

        validate_http_url("OPENAI_API_BASE", &self.api_base)?;

        if self.chat_deployment.is_empty() || self.embedding_deployment.is_empty() {
            return Err(ServiceError::configuration("Azure OpenAI deployment names are required"));
        }

        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(ServiceError::configuration(format!(
                "LLM_TIMEOUT must be a positive number of seconds, got {}",
                self.timeout_seconds
            )));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        crate::error::mapping::AZURE_OPENAI_SERVICE
    }
}

/// Connection settings for an Azure AI Search index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service endpoint, e.g. `https://my-search.search.windows.net`
    pub endpoint: String,

    pub api_key: String,

    pub index_name: String,

    pub api_version: String,

    /// Field holding passage text
    pub content_field: String,

    /// Field holding the passage embedding
    pub vector_field: String,

    pub timeout_seconds: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            index_name: String::new(),
            api_version: "2023-11-01".to_string(),
            content_field: "content".to_string(),
            vector_field: "content_vector".to_string(),
            timeout_seconds: 30.0,
        }
    }
}

impl SearchConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            endpoint: require(provider, "search_service_name")?,
            api_key: require(provider, "search_api_key")?,
            index_name: require(provider, "search_index_name")?,
            api_version: provider.get_string_or("search_api_version", &defaults.api_version),
            content_field: provider.get_string_or("search_content_field", &defaults.content_field),
            vector_field: provider.get_string_or("search_vector_field", &defaults.vector_field),
            timeout_seconds: provider.get_float_or("search_timeout", defaults.timeout_seconds)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Endpoint without a trailing slash
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

impl ServiceConfig for SearchConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::configuration("Azure AI Search API key is required"));
        }

        validate_http_url("SEARCH_SERVICE_NAME", &self.endpoint)?;

        if self.index_name.is_empty() {
            return Err(ServiceError::configuration("Azure AI Search index name is required"));
        }

        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(ServiceError::configuration("SEARCH_TIMEOUT must be a positive number of seconds"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        crate::error::mapping::AZURE_SEARCH_SERVICE
    }
}
