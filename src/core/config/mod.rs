//! Typed application configuration.
//!
//! Loaded from `config.yml` merged with `secrets.yml`, validated before
//! any pipeline is constructed. `PipelineConfig` is the immutable value
//! that keys memoized pipeline construction.

pub mod paths;
pub mod service;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;
use crate::pipeline::prompts;

pub use paths::AppPaths;
pub use service::ConfigService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ProviderConfig {
    /// Config value wins; `GROQ_API_KEY` is the environment fallback.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| env::var("GROQ_API_KEY").ok().filter(|key| !key.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Device hint for local embedding backends; advisory for remote ones.
    pub device: String,
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            device: "cpu".to_string(),
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Location of the prebuilt passage index. Falls back to the data dir.
    pub path: Option<PathBuf>,
}

impl IndexConfig {
    pub fn resolve_path(&self, paths: &AppPaths) -> PathBuf {
        self.path.clone().unwrap_or_else(|| paths.index_path.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub retrieval_k: usize,
    pub rewrite_policy: String,
    pub synthesis_policy: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "llama3-8b-8192".to_string(),
            temperature: 0.3,
            max_tokens: 300,
            retrieval_k: 5,
            rewrite_policy: prompts::REWRITE_POLICY.to_string(),
            synthesis_policy: prompts::SYNTHESIS_POLICY.to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.pipeline.model.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "pipeline.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.pipeline.temperature) {
            return Err(PipelineError::Configuration(format!(
                "pipeline.temperature {} outside 0.0..=2.0",
                self.pipeline.temperature
            )));
        }
        if self.pipeline.max_tokens == 0 {
            return Err(PipelineError::Configuration(
                "pipeline.max_tokens must be positive".to_string(),
            ));
        }
        if self.pipeline.retrieval_k == 0 {
            return Err(PipelineError::Configuration(
                "pipeline.retrieval_k must be positive".to_string(),
            ));
        }
        if self.pipeline.rewrite_policy.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "pipeline.rewrite_policy must not be empty".to_string(),
            ));
        }
        if self.pipeline.synthesis_policy.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "pipeline.synthesis_policy must not be empty".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "embedding.model must not be empty".to_string(),
            ));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Stable value key for pipeline memoization. Two configs with the
    /// same fingerprint map to the same constructed pipeline.
    pub fn fingerprint(&self) -> Result<String, PipelineError> {
        serde_json::to_string(self)
            .map_err(|err| PipelineError::Configuration(format!("unserializable config: {err}")))
    }
}
