//! Error types for the reflexion agent.
//!
//! One taxonomy covers the three external failure surfaces: the model
//! collaborator, the structured-output contract, and the search backend.

use thiserror::Error;

use crate::agent::message::Message;

/// Errors produced by the agent pipeline.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model output does not conform to the requested structured schema.
    #[error("schema violation: {message}")]
    SchemaViolation {
        /// What failed to validate.
        message: String,
        /// The raw model output that failed validation.
        content: String,
    },

    /// Transport, auth, or rate-limit failure contacting the model collaborator.
    #[error("model call failed: {message}")]
    ModelCall {
        /// Provider error description.
        message: String,
        /// HTTP status code, when the transport surfaced one.
        status: Option<u16>,
    },

    /// A single search query errored or timed out.
    ///
    /// Recovered at the dispatcher boundary: the failing query is dropped
    /// from its call's result mapping and the round still completes.
    #[error("tool invocation failed for query {query:?}: {message}")]
    ToolInvocation {
        /// The query that failed.
        query: String,
        /// Failure description.
        message: String,
    },

    /// A required API key was not found in the environment.
    #[error("missing API key: set {var}")]
    ApiKeyMissing {
        /// Environment variable that was checked.
        var: String,
    },

    /// Unknown provider name in configuration.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The configured provider name.
        name: String,
    },

    /// Internal sequencing or state failure.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Failure description.
        message: String,
    },
}

impl AgentError {
    /// Returns `true` when retrying the same model call could help.
    ///
    /// Only schema violations are retryable: the model may produce valid
    /// output on a second attempt. Transport failures are fatal to the run.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SchemaViolation { .. })
    }
}

/// A fatal session failure, carrying the log accumulated before the error.
///
/// The partial log is never silently discarded: callers can render it for
/// diagnosability alongside the error itself.
#[derive(Debug, Error)]
#[error("session failed during {phase}: {source}")]
pub struct SessionError {
    /// The turn/stage that was executing when the failure occurred.
    pub phase: &'static str,
    /// The underlying failure.
    #[source]
    pub source: AgentError,
    /// Messages appended before the failure.
    pub log: Vec<Message>,
}

/// Convenience alias for results using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;
