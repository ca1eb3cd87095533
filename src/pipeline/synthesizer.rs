//! Grounded answer generation from passages, transcript, and utterance.

use std::sync::Arc;

use crate::core::config::PipelineConfig;
use crate::core::errors::PipelineError;
use crate::history::Turn;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rag::Passage;

use super::prompts;

pub struct AnswerSynthesizer {
    provider: Arc<dyn LlmProvider>,
    config: PipelineConfig,
}

impl AnswerSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// Produces an answer grounded in the supplied passages. When no
    /// passages matched, the request steers the model toward the fixed
    /// escalation sentence rather than an unsupported claim.
    pub async fn synthesize(
        &self,
        transcript: &[Turn],
        utterance: &str,
        passages: &[Passage],
    ) -> Result<String, PipelineError> {
        let request = ChatRequest {
            messages: self.build_messages(transcript, utterance, passages),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            stop: None,
        };

        let answer = self
            .provider
            .chat(request, &self.config.model)
            .await
            .map_err(PipelineError::Synthesis)?;

        Ok(answer.trim().to_string())
    }

    fn build_messages(
        &self,
        transcript: &[Turn],
        utterance: &str,
        passages: &[Passage],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: format!(
                "{}\n\n{}",
                self.config.synthesis_policy,
                format_context(passages)
            ),
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

/// Formats passages as a numbered context block with source citations.
/// Relevance scores stay internal to the retriever.
fn format_context(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return prompts::NO_CONTEXT_NOTE.to_string();
    }

    let mut context = String::new();
    for (i, passage) in passages.iter().enumerate() {
        context.push_str(&format!(
            "[{}] (Source: {})\n{}\n\n",
            i + 1,
            passage.source,
            passage.content
        ));
    }

    context.trim_end().to_string()
}
