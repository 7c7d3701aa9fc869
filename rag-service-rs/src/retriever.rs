//! Context retrieval
//!
//! Runs one top-k similarity search and joins the passage texts into the
//! context block handed to the generator.

use std::sync::Arc;

use tool_sdk::error::Result;
use tool_sdk::{Passage, VectorSearch};

/// Delimiter placed between passages in an assembled context
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Fetches and assembles context for a query
#[derive(Clone)]
pub struct ContextRetriever {
    store: Arc<dyn VectorSearch>,
    top_k: usize,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn VectorSearch>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the `top_k` most relevant passages for `query` as one string
    ///
    /// Store errors are returned unmodified and never retried here. No hits
    /// yield an empty string.
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        let hits = self
            .store
            .similarity_search_with_relevance_scores(query, self.top_k)
            .await?;

        tracing::debug!(hits = hits.len(), k = self.top_k, "Vector search completed");

        Ok(assemble_context(&hits))
    }
}

/// Join passage texts in the order given, skipping passages without text
pub fn assemble_context(hits: &[(Passage, f32)]) -> String {
    hits.iter()
        .filter_map(|(passage, _score)| passage.text())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}
