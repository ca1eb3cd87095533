//! Memoized pipeline construction.
//!
//! Construction wires the provider client, opens the passage index, and
//! assembles the pipeline stages; repeating it per turn is disallowed.
//! Pipelines are cached by configuration value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::config::{AppConfig, AppPaths};
use crate::core::errors::PipelineError;
use crate::history::SessionRegistry;
use crate::llm::{GroqProvider, LlmProvider};
use crate::rag::{FlatFileIndex, Retriever, VectorRetriever};

use super::contextualizer::QueryContextualizer;
use super::orchestrator::ConversationalPipeline;
use super::synthesizer::AnswerSynthesizer;

pub type ProviderBuilder =
    Arc<dyn Fn(&AppConfig) -> Result<Arc<dyn LlmProvider>, PipelineError> + Send + Sync>;
pub type RetrieverBuilder = Arc<
    dyn Fn(&AppConfig, Arc<dyn LlmProvider>) -> Result<Arc<dyn Retriever>, PipelineError>
        + Send
        + Sync,
>;

pub struct PipelineFactory {
    registry: Arc<SessionRegistry>,
    build_provider: ProviderBuilder,
    build_retriever: RetrieverBuilder,
    cache: Mutex<HashMap<String, Arc<ConversationalPipeline>>>,
}

impl PipelineFactory {
    /// Factory with the production builders: Groq provider and the
    /// flat-file passage index from the configured location.
    pub fn new(registry: Arc<SessionRegistry>, paths: Arc<AppPaths>) -> Self {
        let build_provider: ProviderBuilder = Arc::new(|config: &AppConfig| {
            let api_key = config.provider.resolve_api_key().ok_or_else(|| {
                PipelineError::Configuration(
                    "missing Groq API key (provider.api_key or GROQ_API_KEY)".to_string(),
                )
            })?;

            let provider: Arc<dyn LlmProvider> = Arc::new(GroqProvider::new(
                config.provider.base_url.clone(),
                api_key,
                Duration::from_secs(config.provider.timeout_secs),
            ));
            Ok(provider)
        });

        let build_retriever: RetrieverBuilder = Arc::new(
            move |config: &AppConfig, provider: Arc<dyn LlmProvider>| {
                let index_path = config.index.resolve_path(&paths);
                let index = Arc::new(FlatFileIndex::open(&index_path)?);

                let retriever: Arc<dyn Retriever> = Arc::new(VectorRetriever::new(
                    provider,
                    index,
                    config.embedding.model.clone(),
                    config.embedding.normalize,
                    config.pipeline.retrieval_k,
                ));
                Ok(retriever)
            },
        );

        Self::with_builders(registry, build_provider, build_retriever)
    }

    /// Factory with substitutable builders; the seam tests use to count
    /// construction work and inject fakes.
    pub fn with_builders(
        registry: Arc<SessionRegistry>,
        build_provider: ProviderBuilder,
        build_retriever: RetrieverBuilder,
    ) -> Self {
        Self {
            registry,
            build_provider,
            build_retriever,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns the pipeline for this configuration, constructing it at
    /// most once. The cache lock is held across construction; concurrent
    /// callers with an identical configuration share a single build.
    pub fn get_or_build(
        &self,
        config: &AppConfig,
    ) -> Result<Arc<ConversationalPipeline>, PipelineError> {
        config.validate()?;
        let key = config.fingerprint()?;

        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(pipeline) = cache.get(&key) {
            return Ok(Arc::clone(pipeline));
        }

        tracing::info!(model = %config.pipeline.model, "constructing conversational pipeline");
        let provider = (self.build_provider)(config)?;
        let retriever = (self.build_retriever)(config, Arc::clone(&provider))?;

        let pipeline = Arc::new(ConversationalPipeline::new(
            QueryContextualizer::new(Arc::clone(&provider), config.pipeline.clone()),
            retriever,
            AnswerSynthesizer::new(provider, config.pipeline.clone()),
            Arc::clone(&self.registry),
        ));

        cache.insert(key, Arc::clone(&pipeline));
        Ok(pipeline)
    }
}
