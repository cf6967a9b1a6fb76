//! Binary entry point for the reflexion CLI.

// The CLI writes its result to stdout by design.
#![allow(clippy::print_stdout)]

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reflexion::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials come from the environment at startup only.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let output = cli::execute(&args).await?;
    println!("{output}");
    Ok(())
}
