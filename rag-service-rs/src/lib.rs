//! # RAG Service
//!
//! Answers natural-language questions from an Azure AI Search index using an
//! Azure OpenAI chat deployment.
//!
//! A request flows one way through the service:
//!
//! - [`retriever`] fetches the top-k passages and joins them into a context
//! - [`generator`] prompts the model under bounded retries and flattens the reply
//! - [`pipeline`] sequences the two and maps failures to HTTP categories
//! - [`api`] exposes the pipeline over HTTP
//!
//! Model calls are measured by [`instrumentation`]; backend clients are held
//! by a lazily-initialized [`clients::ClientRegistry`].

pub mod api;
pub mod clients;
pub mod generator;
pub mod instrumentation;
pub mod logging;
pub mod pipeline;
pub mod retriever;
pub mod settings;

pub use generator::{AnswerGenerator, GenerationError, GeneratorConfig};
pub use instrumentation::{CallTimer, InMemorySink, MetricsSink, PrometheusSink};
pub use pipeline::{AnswerEnvelope, AskError, RagPipeline};
pub use retriever::{ContextRetriever, PASSAGE_SEPARATOR};
pub use settings::Settings;
