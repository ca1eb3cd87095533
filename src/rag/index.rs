//! Flat passage index over a prebuilt embedding file.
//!
//! The index file is JSONL, one `{content, source, embedding}` record per
//! line, produced by an upstream ingestion job. This module only loads
//! and queries it; building the index is out of scope.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use super::retriever::Passage;
use crate::core::errors::{PipelineError, RetrievalError};

#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Search contract over a loaded vector index.
pub trait PassageIndex: Send + Sync {
    fn search(&self, query_embedding: &[f32], limit: usize)
        -> Result<Vec<ScoredPassage>, RetrievalError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
struct IndexRecord {
    content: String,
    source: String,
    embedding: Vec<f32>,
}

/// Brute-force cosine index held fully in memory.
#[derive(Debug)]
pub struct FlatFileIndex {
    records: Vec<(Passage, Vec<f32>)>,
}

impl FlatFileIndex {
    /// Opens a JSONL index file. A missing or unreadable file is fatal to
    /// pipeline construction, not a per-turn failure.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|err| {
            PipelineError::Configuration(format!(
                "cannot open passage index {}: {err}",
                path.display()
            ))
        })?;

        let mut records = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| {
                PipelineError::Configuration(format!(
                    "cannot read passage index {}: {err}",
                    path.display()
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let record: IndexRecord = serde_json::from_str(&line).map_err(|err| {
                PipelineError::Configuration(format!(
                    "bad index record at {}:{}: {err}",
                    path.display(),
                    line_no + 1
                ))
            })?;

            records.push((
                Passage {
                    content: record.content,
                    source: record.source,
                },
                record.embedding,
            ));
        }

        tracing::info!("loaded {} passages from {}", records.len(), path.display());
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<(Passage, Vec<f32>)>) -> Self {
        Self { records }
    }
}

impl PassageIndex for FlatFileIndex {
    fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPassage>, RetrievalError> {
        if query_embedding.is_empty() {
            return Err(RetrievalError("query embedding is empty".to_string()));
        }

        let mut scored: Vec<ScoredPassage> = self
            .records
            .iter()
            .map(|(passage, embedding)| ScoredPassage {
                passage: passage.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
