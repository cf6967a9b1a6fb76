//! Message log types for the reflexion conversation.
//!
//! The session state is an ordered, append-only sequence of [`Message`]s:
//! the human question, assistant drafts/revisions carrying structured calls,
//! and tool messages carrying merged search results. These types decouple
//! the loop logic from any specific LLM SDK.

use serde::{Deserialize, Serialize};

use super::schema::SchemaKind;

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user's question.
    Human,
    /// Draft or revision produced by the model.
    Assistant,
    /// Merged search results for one structured call.
    Tool,
}

/// A structured call emitted by the model.
///
/// The `id` is assigned by the model-call layer and is opaque and stable
/// for the life of the turn; tool messages reference it to re-associate
/// results with the call that requested them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Which output schema the payload claims to conform to.
    pub schema: SchemaKind,
    /// JSON-encoded payload. Validated by [`schema::parse_call`](super::schema::parse_call).
    pub arguments: String,
}

/// A single message in the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Message content. For tool messages, the serialized
    /// `{query -> result}` mapping.
    pub content: String,
    /// Structured calls requested by the assistant (only for `Role::Assistant`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structured_calls: Vec<StructuredCall>,
    /// Structured call ID this message responds to (only for `Role::Tool`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originating_call_id: Option<String>,
}

/// Creates a human message holding the user's question.
#[must_use]
pub fn human_message(content: &str) -> Message {
    Message {
        role: Role::Human,
        content: content.to_string(),
        structured_calls: Vec::new(),
        originating_call_id: None,
    }
}

/// Creates an assistant message carrying structured calls.
#[must_use]
pub fn assistant_message(content: String, structured_calls: Vec<StructuredCall>) -> Message {
    Message {
        role: Role::Assistant,
        content,
        structured_calls,
        originating_call_id: None,
    }
}

/// Creates a tool message responding to one structured call.
#[must_use]
pub fn tool_message(originating_call_id: &str, content: String) -> Message {
    Message {
        role: Role::Tool,
        content,
        structured_calls: Vec::new(),
        originating_call_id: Some(originating_call_id.to_string()),
    }
}

/// Counts completed tool rounds in the log.
///
/// Tool messages are only ever appended once per completed dispatch round
/// (one per originating structured call, and the forced-schema contract
/// yields one call per assistant turn), so counting them is a replayable
/// proxy for rounds completed without extra mutable state.
#[must_use]
pub fn tool_rounds_completed(log: &[Message]) -> usize {
    log.iter().filter(|m| m.role == Role::Tool).count()
}

/// Returns the last assistant message in the log, if any.
#[must_use]
pub fn last_assistant(log: &[Message]) -> Option<&Message> {
    log.iter().rev().find(|m| m.role == Role::Assistant)
}
