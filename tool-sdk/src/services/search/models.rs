//! Azure AI Search REST data models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pure vector query against one vector field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorQuery {
    /// Always `"vector"`; the query embedding is computed client-side
    pub kind: String,

    pub vector: Vec<f32>,

    /// Comma-separated vector field names
    pub fields: String,

    /// Number of nearest neighbours to return
    pub k: usize,
}

/// Body of `POST /indexes/{index}/docs/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "vectorQueries")]
    pub vector_queries: Vec<VectorQuery>,

    /// Maximum number of documents in the response
    pub top: usize,
}

/// One hit in a search response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Relevance score, higher is more relevant
    #[serde(rename = "@search.score", default)]
    pub score: f32,

    /// All remaining document fields, including the content field
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

/// Response of a search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub value: Vec<SearchDocument>,
}
