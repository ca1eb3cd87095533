//! Retriever contract consumed by the conversational pipeline.
//!
//! The pipeline only depends on `retrieve(query)`; how passages are
//! indexed and scored lives behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RetrievalError;

/// A retrieved unit of knowledge-base text with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    /// Source identifier (document name, URL, etc.)
    pub source: String,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns the most relevant passages for the query, best first.
    /// An empty result is valid and means nothing matched.
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RetrievalError>;
}
