//! Fixed policy texts for the conversational pipeline.
//!
//! These are contracts with the model, not mechanically enforced; the
//! test suite asserts they are present in outgoing requests.

/// Rewriting policy: turn a follow-up into a standalone question without
/// answering it.
pub const REWRITE_POLICY: &str = "As JupiterBot, rewrite the user's follow-up message into a \
clear, standalone question. Include relevant chat history, domain-specific terms (e.g., \
'Jupiter card', 'Jewels'), and clarify any ambiguity to make it fully self-contained.";

/// Persona and grounding policy for answer synthesis. The retrieved
/// context block is appended below this text in the system message.
pub const SYNTHESIS_POLICY: &str = "You are Jupiter's Tier-1 Support Bot. Provide friendly, \
professional responses (2-3 sentences) using the provided context.\n\
If relevant, include clear actionable steps like app navigation (e.g., 'Go to Settings > Card > \
Block Card') or links to the Help Center.\n\
If unsure, reply: 'I'm not certain—let me escalate this or check with our team.'\n\
Avoid using internal system terms. Always prioritize clarity and customer understanding.";

/// The exact escalation sentence the synthesis policy mandates when the
/// model is not confident.
pub const ESCALATION_SENTENCE: &str =
    "I'm not certain—let me escalate this or check with our team.";

/// Inserted in place of the context block when retrieval matched nothing,
/// steering the model toward the escalation sentence instead of invention.
pub const NO_CONTEXT_NOTE: &str =
    "No knowledge base passages matched this question. Do not invent an answer.";
