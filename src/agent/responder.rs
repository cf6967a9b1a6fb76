//! Responder/reviser stage: one model call per turn with a role-specific
//! instruction set, requesting one schema from the structured output
//! contract.
//!
//! The stage validates the model's output before returning the assistant
//! message; it never retries on its own. Retry policy lives in the
//! orchestrator.

use std::sync::Arc;

use tracing::debug;

use super::config::AgentConfig;
use super::message::{Message, assistant_message};
use super::prompt::{DRAFTER_SYSTEM_PROMPT, REVISER_SYSTEM_PROMPT};
use super::provider::{CompletionRequest, LlmProvider};
use super::schema::{self, SchemaKind};
use crate::error::AgentError;

/// Issues draft and revision turns against the model collaborator.
pub struct Responder {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Responder {
    /// Creates a responder bound to the given provider and configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AgentConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// First turn: produce a draft, a self-critique, and up to 3 queries.
    ///
    /// # Errors
    ///
    /// Surfaces [`AgentError::ModelCall`] and [`AgentError::SchemaViolation`]
    /// unmodified; no retry at this layer.
    pub async fn draft(&self, log: &[Message]) -> Result<Message, AgentError> {
        self.run_turn(log, SchemaKind::AnswerQuestion, DRAFTER_SYSTEM_PROMPT)
            .await
    }

    /// Subsequent turns: revise using the latest tool results and cite
    /// sources actually used.
    ///
    /// # Errors
    ///
    /// Same contract as [`Responder::draft`].
    pub async fn revise(&self, log: &[Message]) -> Result<Message, AgentError> {
        self.run_turn(log, SchemaKind::ReviseAnswer, REVISER_SYSTEM_PROMPT)
            .await
    }

    /// Runs one model call and validates the structured output.
    ///
    /// Returns the new assistant message; the caller appends it to the log
    /// (append-only: prior messages are never mutated).
    async fn run_turn(
        &self,
        log: &[Message],
        target: SchemaKind,
        instructions: &str,
    ) -> Result<Message, AgentError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            instructions: instructions.to_string(),
            messages: log.to_vec(),
            schema: target,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        let response = self.provider.complete(&request).await?;

        let call = response.structured_calls.first().ok_or_else(|| {
            AgentError::SchemaViolation {
                message: format!("model returned no {} call", target.name()),
                content: response.content.clone(),
            }
        })?;

        if call.schema != target {
            return Err(AgentError::SchemaViolation {
                message: format!(
                    "model answered with {} instead of {}",
                    call.schema.name(),
                    target.name()
                ),
                content: call.arguments.clone(),
            });
        }

        // Validate the payload before the message enters the log.
        let parsed = schema::parse_call(call)?;
        debug!(
            schema = target.name(),
            call_id = call.id,
            queries = parsed.search_queries().len(),
            tokens = response.usage.total_tokens,
            "turn completed"
        );

        Ok(assistant_message(
            response.content,
            response.structured_calls,
        ))
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{StructuredCall, human_message};
    use crate::agent::provider::{CompletionResponse, TokenUsage};

    use async_trait::async_trait;

    /// Mock provider returning a fixed set of structured calls.
    struct FixedProvider {
        calls: Vec<StructuredCall>,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, AgentError> {
            Ok(CompletionResponse {
                content: String::new(),
                structured_calls: self.calls.clone(),
                usage: TokenUsage::default(),
            })
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("k")
            .search_api_key("k")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn valid_call(schema: SchemaKind) -> StructuredCall {
        let mut payload = serde_json::json!({
            "answer": "draft answer",
            "reflection": {"missing": "depth", "superfluous": "preamble"},
            "search_queries": ["q1", "q2"],
        });
        if schema == SchemaKind::ReviseAnswer {
            payload["references"] = serde_json::json!(["https://example.com"]);
        }
        StructuredCall {
            id: "call_1".to_string(),
            schema,
            arguments: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn test_draft_returns_assistant_message() {
        let provider = Arc::new(FixedProvider {
            calls: vec![valid_call(SchemaKind::AnswerQuestion)],
        });
        let responder = Responder::new(provider, &config());

        let log = vec![human_message("question")];
        let msg = responder
            .draft(&log)
            .await
            .unwrap_or_else(|e| panic!("draft failed: {e}"));

        assert_eq!(msg.structured_calls.len(), 1);
        assert_eq!(msg.structured_calls[0].schema, SchemaKind::AnswerQuestion);
    }

    #[tokio::test]
    async fn test_missing_call_is_schema_violation() {
        let provider = Arc::new(FixedProvider { calls: Vec::new() });
        let responder = Responder::new(provider, &config());

        let result = responder.draft(&[human_message("q")]).await;
        assert!(matches!(
            result,
            Err(AgentError::SchemaViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_wrong_schema_is_rejected() {
        let provider = Arc::new(FixedProvider {
            calls: vec![valid_call(SchemaKind::AnswerQuestion)],
        });
        let responder = Responder::new(provider, &config());

        // Asking for a revision but receiving a draft shape
        let result = responder.revise(&[human_message("q")]).await;
        match result {
            Err(AgentError::SchemaViolation { message, .. }) => {
                assert!(message.contains("ReviseAnswer"), "got: {message}");
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let provider = Arc::new(FixedProvider {
            calls: vec![StructuredCall {
                id: "call_1".to_string(),
                schema: SchemaKind::AnswerQuestion,
                arguments: r#"{"reflection": {"missing": "", "superfluous": ""}, "search_queries": ["q"]}"#.to_string(),
            }],
        });
        let responder = Responder::new(provider, &config());

        let result = responder.draft(&[human_message("q")]).await;
        assert!(matches!(result, Err(AgentError::SchemaViolation { .. })));
    }
}
