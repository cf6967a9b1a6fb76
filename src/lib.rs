//! Reflexion: an iterative draft → search → revise agent loop.
//!
//! The orchestrator enforces a strict turn order among drafting, tool
//! execution, and revision; fans out search queries concurrently while
//! re-associating each result batch with the structured call that
//! requested it; and decides after every revision whether to loop or
//! terminate. The LLM and the search backend are treated as unreliable,
//! schema-violating, rate-limited external collaborators.

pub mod agent;
pub mod cli;
pub mod error;

pub use agent::{AgentConfig, Orchestrator};
pub use error::{AgentError, SessionError};
