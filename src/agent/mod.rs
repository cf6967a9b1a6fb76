//! Reflexion agent loop.
//!
//! Drafts an answer, critiques it against its own stated gaps, fans out
//! search queries to address those gaps, and revises with the retrieved
//! evidence until a bounded iteration count is reached.
//!
//! # Architecture
//!
//! ```text
//! Question → Orchestrator
//!   ├── Responder (draft: answer + critique + search queries)
//!   ├── ToolDispatcher (concurrent search fan-out, merged per call)
//!   ├── Responder (revise: answer + citations + fresh queries)
//!   └── Loop controller: revise → dispatch again | terminate
//! ```

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod responder;
pub mod schema;
pub mod search;

// Re-export key types
pub use config::AgentConfig;
pub use controller::{Phase, next_phase, render_graph};
pub use dispatcher::{ToolDispatcher, ToolInvocation};
pub use message::{Message, Role, StructuredCall};
pub use orchestrator::{Orchestrator, final_answer};
pub use provider::{CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};
pub use responder::Responder;
pub use schema::{AnswerQuestion, ParsedCall, Reflection, ReviseAnswer, SchemaKind};
pub use search::{SearchProvider, SearchResult, TavilySearch};
