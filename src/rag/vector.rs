//! Embedding-backed retriever over a loaded passage index.

use std::sync::Arc;

use async_trait::async_trait;

use super::index::PassageIndex;
use super::retriever::{Passage, Retriever};
use crate::core::errors::RetrievalError;
use crate::llm::LlmProvider;

/// Embeds the query through the provider and delegates top-k search to
/// the index. Retrieval breadth is bound at construction time.
pub struct VectorRetriever {
    embedder: Arc<dyn LlmProvider>,
    index: Arc<dyn PassageIndex>,
    embedding_model: String,
    normalize: bool,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(
        embedder: Arc<dyn LlmProvider>,
        index: Arc<dyn PassageIndex>,
        embedding_model: String,
        normalize: bool,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            embedding_model,
            normalize,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, RetrievalError> {
        let embeddings = self
            .embedder
            .embed(&[query.to_string()], &self.embedding_model)
            .await
            .map_err(|err| RetrievalError(format!("query embedding failed: {err}")))?;

        let mut query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError("embedding provider returned no vector".to_string()))?;

        if self.normalize {
            l2_normalize(&mut query_embedding);
        }

        let scored = self.index.search(&query_embedding, self.top_k)?;
        tracing::debug!(
            passages = scored.len(),
            top_k = self.top_k,
            "retrieved passages"
        );

        Ok(scored.into_iter().map(|s| s.passage).collect())
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
