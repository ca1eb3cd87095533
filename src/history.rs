//! In-memory session transcripts.
//!
//! Each session id owns an append-only ordered sequence of turns. Nothing
//! is persisted beyond process lifetime; a new session id gets a fresh
//! empty transcript on first use.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: TurnRole, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Keyed store of session transcripts.
///
/// Writers take the lock once per operation, so turns appended for one
/// session never interleave with another session's transcript.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the session's transcript, creating an empty
    /// one on first use.
    pub fn get_or_create(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    /// Appends one user turn and one assistant turn, in that order, under
    /// a single lock acquisition.
    pub fn append_exchange(&self, session_id: &str, utterance: &str, answer: &str) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let transcript = sessions.entry(session_id.to_string()).or_default();
        transcript.push(Turn::new(TurnRole::User, utterance));
        transcript.push(Turn::new(TurnRole::Assistant, answer));
    }

    /// Replaces the session's transcript with an empty sequence. Idempotent;
    /// clearing an absent session is not an error.
    pub fn clear(&self, session_id: &str) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions.insert(session_id.to_string(), Vec::new());
    }

    pub fn turn_count(&self, session_id: &str) -> usize {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions.get(session_id).map(Vec::len).unwrap_or(0)
    }
}
