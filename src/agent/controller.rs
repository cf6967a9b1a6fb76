//! Loop controller: the turn-sequencing state machine.
//!
//! Replaces a declarative node/edge graph with a tagged-variant state
//! machine driven by explicit transition logic, making the single
//! conditional transition (`Revise -> Dispatch | Terminated`) directly
//! unit-testable. The decision step is pure computation and never suspends.

/// Phase of the reflexion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial responder call producing the first draft.
    Draft,
    /// Concurrent search round for the latest structured calls.
    Dispatch,
    /// Reviser call incorporating the latest tool results.
    Revise,
    /// Absorbing terminal state; the log is returned as-is.
    Terminated,
}

impl Phase {
    /// Stage name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Dispatch => "execute_tools",
            Self::Revise => "revise",
            Self::Terminated => "terminate",
        }
    }
}

/// Computes the next phase from the current one and the derived round count.
///
/// `tool_rounds_completed` counts tool-role messages currently in the log,
/// including the one just produced by this round. The loop continues only
/// while fewer than `max_iterations` rounds have completed: the original
/// formulation compared with a strict greater-than and silently permitted
/// one extra round, which is deliberately not reproduced here.
#[must_use]
pub const fn next_phase(
    current: Phase,
    tool_rounds_completed: usize,
    max_iterations: usize,
) -> Phase {
    match current {
        Phase::Draft => Phase::Dispatch,
        Phase::Dispatch => Phase::Revise,
        Phase::Revise => {
            if tool_rounds_completed < max_iterations {
                Phase::Dispatch
            } else {
                Phase::Terminated
            }
        }
        Phase::Terminated => Phase::Terminated,
    }
}

/// Renders the turn graph in mermaid flowchart syntax.
///
/// Nodes: draft, execute_tools, revise. The one conditional edge leaves
/// revise and either loops back to execute_tools or terminates.
#[must_use]
pub fn render_graph() -> String {
    let mut out = String::from("graph TD\n");
    out.push_str("    __start__ --> draft\n");
    out.push_str("    draft --> execute_tools\n");
    out.push_str("    execute_tools --> revise\n");
    out.push_str("    revise -. rounds < max .-> execute_tools\n");
    out.push_str("    revise -. rounds >= max .-> __end__\n");
    out
}
