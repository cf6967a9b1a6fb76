//! CLI command implementation and output rendering.

#![allow(clippy::format_push_string)]

use serde_json::json;

use crate::agent::{
    AgentConfig, Message, Orchestrator, Role, TavilySearch, controller, final_answer, providers,
    schema,
};
use crate::cli::parser::Cli;
use crate::error::SessionError;

/// Output rendering format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, defaulting to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Executes the CLI: builds the collaborators, runs the session, and
/// renders the turn graph, final answer, and full message log.
///
/// # Errors
///
/// Returns an error on configuration problems or any unrecovered
/// collaborator failure; the partial log is rendered into the error text
/// so it is never silently discarded.
pub async fn execute(cli: &Cli) -> anyhow::Result<String> {
    let mut builder = AgentConfig::builder().from_env();
    if let Some(n) = cli.max_iterations {
        builder = builder.max_iterations(n);
    }
    if let Some(k) = cli.max_results {
        builder = builder.max_results(k);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    let config = builder.build()?;
    let format = OutputFormat::parse(&cli.format);

    let provider = providers::create_provider(&config)?;
    let search = std::sync::Arc::new(TavilySearch::new(&config)?);
    let orchestrator = Orchestrator::new(provider, search, &config);

    let log = orchestrator
        .run(&cli.question)
        .await
        .map_err(|e| render_failure(&e, format))?;

    Ok(render_session(&log, format))
}

/// Renders a completed session: graph, answer, log.
fn render_session(log: &[Message], format: OutputFormat) -> String {
    let answer = final_answer(log).unwrap_or_else(|| "(no structured answer produced)".to_string());

    match format {
        OutputFormat::Json => {
            let value = json!({
                "graph": controller::render_graph(),
                "answer": answer,
                "log": log,
            });
            serde_json::to_string_pretty(&value).unwrap_or_default()
        }
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&controller::render_graph());
            out.push_str("\n== Final answer ==\n");
            out.push_str(&answer);
            out.push_str("\n\n== Message log ==\n");
            out.push_str(&render_log(log));
            out
        }
    }
}

/// Renders the message log as indented text, one block per message.
fn render_log(log: &[Message]) -> String {
    let mut out = String::new();
    for (i, msg) in log.iter().enumerate() {
        let role = match msg.role {
            Role::Human => "human",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        out.push_str(&format!("[{i}] {role}"));
        if let Some(ref id) = msg.originating_call_id {
            out.push_str(&format!(" (for {id})"));
        }
        out.push('\n');

        for call in &msg.structured_calls {
            out.push_str(&format!("    call {} -> {}\n", call.id, call.schema.name()));
            if let Ok(parsed) = schema::parse_call(call) {
                out.push_str(&format!("    answer: {}\n", truncate(parsed.answer(), 200)));
                for query in parsed.search_queries() {
                    out.push_str(&format!("    query: {query}\n"));
                }
                for reference in parsed.references() {
                    out.push_str(&format!("    ref: {reference}\n"));
                }
            }
        }
        if msg.structured_calls.is_empty() && !msg.content.is_empty() {
            out.push_str(&format!("    {}\n", truncate(&msg.content, 400)));
        }
    }
    out
}

/// Renders a fatal failure with the partial log attached.
fn render_failure(err: &SessionError, format: OutputFormat) -> anyhow::Error {
    let partial = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&err.log).unwrap_or_default(),
        OutputFormat::Text => render_log(&err.log),
    };
    anyhow::anyhow!("{err}\n\nPartial log before failure:\n{partial}")
}

/// Truncates on a char boundary, appending an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}
