//! Orchestrator for the reflexion session.
//!
//! Owns the session state (the message log), drives the loop controller
//! through Draft → Dispatch → Revise until `Terminated`, and applies the
//! retry policy for schema-violating model output. Collaborators are
//! explicitly constructed and injected; nothing here is a global.

use std::sync::Arc;

use tracing::{debug, warn};

use super::config::AgentConfig;
use super::controller::{Phase, next_phase};
use super::dispatcher::ToolDispatcher;
use super::message::{self, Message, human_message};
use super::provider::LlmProvider;
use super::responder::Responder;
use super::schema;
use super::search::SearchProvider;
use crate::error::{AgentError, SessionError};

/// Drives one question through the reflexion loop.
pub struct Orchestrator {
    responder: Responder,
    dispatcher: ToolDispatcher,
    max_iterations: usize,
    max_retries: u32,
}

impl Orchestrator {
    /// Creates an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            responder: Responder::new(provider, config),
            dispatcher: ToolDispatcher::new(search, config),
            max_iterations: config.max_iterations,
            max_retries: config.max_retries,
        }
    }

    /// Runs a full session for one question, returning the final log.
    ///
    /// The log is owned exclusively by this call and mutated only by
    /// append; it is destroyed (moved out) when the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on any unrecovered collaborator failure,
    /// carrying the log accumulated so far for diagnosability.
    pub async fn run(&self, question: &str) -> Result<Vec<Message>, SessionError> {
        let mut log = vec![human_message(question)];
        let mut phase = Phase::Draft;

        loop {
            match phase {
                Phase::Draft => {
                    let msg = match self.model_turn_with_retry(&log, false).await {
                        Ok(msg) => msg,
                        Err(e) => return Err(fail(phase, e, log)),
                    };
                    log.push(msg);
                }
                Phase::Dispatch => {
                    let Some(latest) = message::last_assistant(&log).cloned() else {
                        return Err(fail(
                            phase,
                            AgentError::Orchestration {
                                message: "dispatch reached with no assistant message".to_string(),
                            },
                            log,
                        ));
                    };
                    let tool_messages = match self.dispatcher.dispatch(&latest).await {
                        Ok(msgs) => msgs,
                        Err(e) => return Err(fail(phase, e, log)),
                    };
                    log.extend(tool_messages);
                }
                Phase::Revise => {
                    let msg = match self.model_turn_with_retry(&log, true).await {
                        Ok(msg) => msg,
                        Err(e) => return Err(fail(phase, e, log)),
                    };
                    log.push(msg);
                }
                Phase::Terminated => return Ok(log),
            }

            let rounds = message::tool_rounds_completed(&log);
            let previous = phase;
            phase = next_phase(phase, rounds, self.max_iterations);
            debug!(
                from = previous.name(),
                to = phase.name(),
                rounds,
                "phase transition"
            );
        }
    }

    /// Runs one model turn, retrying schema violations up to `max_retries`.
    ///
    /// Transport failures abort immediately; only a violation of the
    /// structured output contract warrants asking the model again.
    async fn model_turn_with_retry(
        &self,
        log: &[Message],
        revision: bool,
    ) -> Result<Message, AgentError> {
        let mut attempt: u32 = 0;
        loop {
            let result = if revision {
                self.responder.revise(log).await
            } else {
                self.responder.draft(log).await
            };

            match result {
                Ok(msg) => return Ok(msg),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, max = self.max_retries, error = %e, "retrying model call");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("max_iterations", &self.max_iterations)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn fail(phase: Phase, source: AgentError, log: Vec<Message>) -> SessionError {
    SessionError {
        phase: phase.name(),
        source,
        log,
    }
}

/// Extracts the user-facing answer from the final log.
///
/// Reads the last assistant message's first structured call and returns
/// its `answer` field.
#[must_use]
pub fn final_answer(log: &[Message]) -> Option<String> {
    let latest = message::last_assistant(log)?;
    let call = latest.structured_calls.first()?;
    schema::parse_call(call)
        .ok()
        .map(|parsed| parsed.answer().to_string())
}
