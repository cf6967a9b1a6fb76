//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::Parser;

/// Reflexion: draft an answer, critique it, search the gaps, revise with
/// evidence.
///
/// Runs one question through a bounded draft → search → revise loop and
/// prints the turn graph, the final answer, and the full message log.
#[derive(Parser, Debug)]
#[command(name = "reflexion")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"Examples:
  reflexion "Write about AI-powered SOC startups and funding."
  reflexion --max-iterations 3 "What changed in HTTP/3?"
  reflexion --format json "Compare RISC-V vector extensions" | jq '.log'

Environment:
  OPENAI_API_KEY    model provider credential (required)
  TAVILY_API_KEY    search backend credential (required)
  OPENAI_BASE_URL   OpenAI-compatible endpoint override
"#)]
pub struct Cli {
    /// The question to research and answer.
    pub question: String,

    /// Maximum dispatch/revise rounds after the initial draft.
    #[arg(short = 'i', long, env = "REFLEXION_MAX_ITERATIONS")]
    pub max_iterations: Option<usize>,

    /// Search results requested per query.
    #[arg(short = 'k', long, env = "REFLEXION_MAX_RESULTS")]
    pub max_results: Option<usize>,

    /// Model identifier for draft and revision turns.
    #[arg(short, long, env = "REFLEXION_MODEL")]
    pub model: Option<String>,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,
}
