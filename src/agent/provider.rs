//! Pluggable LLM provider trait.
//!
//! Implementations translate the provider-agnostic [`CompletionRequest`]
//! into vendor SDK calls, returning the structured calls the model emitted.
//! This keeps the loop logic decoupled from any particular LLM vendor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::{Message, StructuredCall};
use super::schema::SchemaKind;
use crate::error::AgentError;

/// A completion request carrying the log and one target schema.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "gpt-5.2-2025-12-11").
    pub model: String,
    /// Role-specific instruction set (system prompt).
    pub instructions: String,
    /// Ordered conversation log.
    pub messages: Vec<Message>,
    /// Output schema the model must conform to.
    pub schema: SchemaKind,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// A completion response (provider-agnostic).
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Free-text content, usually empty when structured calls are present.
    pub content: String,
    /// Structured calls emitted by the model. Call IDs are provider-assigned
    /// and must be treated as opaque.
    pub structured_calls: Vec<StructuredCall>,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

/// Trait for LLM provider backends.
///
/// Implementations handle the transport layer (HTTP, SDK calls, retries)
/// for a specific provider while presenting a uniform interface to the
/// responder stage.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a completion request, forcing output onto the target schema.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ModelCall`] on transport, auth, or rate-limit
    /// failures.
    async fn complete(&self, request: &CompletionRequest)
    -> Result<CompletionResponse, AgentError>;
}
