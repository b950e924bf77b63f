//! Binary crate for the `wnotify` daemon and command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring the core services together from config
//! - Running the scheduler and printing human-friendly output

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
