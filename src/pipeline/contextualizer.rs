//! Standalone-query rewriting over the session transcript.

use std::sync::Arc;

use crate::core::config::PipelineConfig;
use crate::core::errors::{PipelineError, ProviderError};
use crate::history::Turn;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

pub struct QueryContextualizer {
    provider: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl QueryContextualizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// Rewrites the utterance into a fully self-contained question,
    /// resolving pronouns and shorthand against the transcript.
    ///
    /// The model is invoked even on an empty transcript so phrasing is
    /// normalized uniformly. A provider failure aborts the turn; the raw
    /// utterance is never silently substituted for the rewrite.
    pub async fn contextualize(
        &self,
        transcript: &[Turn],
        utterance: &str,
    ) -> Result<String, PipelineError> {
        let request = ChatRequest {
            messages: self.build_messages(transcript, utterance),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            stop: None,
        };

        let rewritten = self
            .provider
            .chat(request, &self.config.model)
            .await
            .map_err(PipelineError::Contextualization)?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Err(PipelineError::Contextualization(ProviderError::Malformed(
                "empty rewrite".to_string(),
            )));
        }

        Ok(rewritten.to_string())
    }

    fn build_messages(&self, transcript: &[Turn], utterance: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: self.config.rewrite_policy.clone(),
        });

        for turn in transcript {
            messages.push(ChatMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: utterance.to_string(),
        });

        messages
    }
}
