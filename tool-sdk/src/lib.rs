//! # Tool SDK
//!
//! Typed clients for the backends of the RAG service.
//!
//! This crate provides:
//!
//! - Backend traits the pipeline is written against (`ChatCompletions`,
//!   `Embeddings`, `VectorSearch`)
//! - An Azure OpenAI client for chat completions and embeddings
//! - An Azure AI Search vector store
//! - A normalized error type with HTTP error mapping
//! - Bounded retry with exponential backoff
//! - Configuration providers backed by the environment or memory

// Re-export core modules
pub mod core;
pub use core::{ChatCompletions, Embeddings, Passage, VectorSearch};

// Re-export service-specific modules
pub mod services;
pub use services::{openai, search};

// Re-export error handling
pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

// Re-export resilience patterns
pub mod resilience;
pub use resilience::{RetryConfig, RetryExecutor};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, ServiceConfig};

pub mod util;

#[cfg(test)]
mod tests;

/// Create an Azure OpenAI client from the process environment
pub fn azure_openai_client() -> Result<services::openai::AzureOpenAIClient> {
    services::openai::AzureOpenAIClient::from_env()
}
