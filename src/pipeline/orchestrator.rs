//! Per-turn pipeline orchestration.
//!
//! A turn runs contextualization, retrieval, and synthesis in sequence
//! and commits exactly one user turn and one assistant turn on success.
//! A failed turn leaves the transcript untouched.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::core::errors::PipelineError;
use crate::history::SessionRegistry;
use crate::rag::Retriever;

use super::contextualizer::QueryContextualizer;
use super::synthesizer::AnswerSynthesizer;

/// Turn phases, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Received,
    Contextualizing,
    Retrieving,
    Synthesizing,
    Committed,
    Failed,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Received => "received",
            TurnPhase::Contextualizing => "contextualizing",
            TurnPhase::Retrieving => "retrieving",
            TurnPhase::Synthesizing => "synthesizing",
            TurnPhase::Committed => "committed",
            TurnPhase::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    /// Provenance of the passages that grounded the answer, deduplicated,
    /// retrieval order preserved.
    pub sources: Vec<String>,
}

/// One constructed conversational pipeline. Construction is expensive
/// (provider clients, index loading); instances are built once per
/// configuration by the factory and shared across turns.
pub struct ConversationalPipeline {
    contextualizer: QueryContextualizer,
    retriever: Arc<dyn Retriever>,
    synthesizer: AnswerSynthesizer,
    registry: Arc<SessionRegistry>,
}

impl std::fmt::Debug for ConversationalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationalPipeline").finish_non_exhaustive()
    }
}

impl ConversationalPipeline {
    pub fn new(
        contextualizer: QueryContextualizer,
        retriever: Arc<dyn Retriever>,
        synthesizer: AnswerSynthesizer,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            contextualizer,
            retriever,
            synthesizer,
            registry,
        }
    }

    /// Processes one conversational turn for the session.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        utterance: &str,
    ) -> Result<TurnOutcome, PipelineError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(PipelineError::EmptyUtterance);
        }

        let turn_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::debug!(
            %turn_id,
            session_id,
            phase = TurnPhase::Received.as_str(),
            "turn received"
        );

        match self.run_turn(session_id, utterance, turn_id).await {
            Ok(outcome) => {
                tracing::info!(
                    %turn_id,
                    session_id,
                    phase = TurnPhase::Committed.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "turn committed"
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(
                    %turn_id,
                    session_id,
                    phase = TurnPhase::Failed.as_str(),
                    error = %err,
                    "turn failed, transcript unchanged"
                );
                Err(err)
            }
        }
    }

    async fn run_turn(
        &self,
        session_id: &str,
        utterance: &str,
        turn_id: Uuid,
    ) -> Result<TurnOutcome, PipelineError> {
        let transcript = self.registry.get_or_create(session_id);

        tracing::debug!(
            %turn_id,
            phase = TurnPhase::Contextualizing.as_str(),
            history_len = transcript.len(),
            "rewriting utterance"
        );
        let query = self
            .contextualizer
            .contextualize(&transcript, utterance)
            .await?;

        tracing::debug!(%turn_id, phase = TurnPhase::Retrieving.as_str(), "retrieving passages");
        let passages = self.retriever.retrieve(&query).await?;

        tracing::debug!(
            %turn_id,
            phase = TurnPhase::Synthesizing.as_str(),
            passages = passages.len(),
            "synthesizing answer"
        );
        let answer = self
            .synthesizer
            .synthesize(&transcript, utterance, &passages)
            .await?;

        let mut sources: Vec<String> = Vec::new();
        for passage in &passages {
            if !sources.contains(&passage.source) {
                sources.push(passage.source.clone());
            }
        }

        self.registry.append_exchange(session_id, utterance, &answer);

        Ok(TurnOutcome { answer, sources })
    }
}
