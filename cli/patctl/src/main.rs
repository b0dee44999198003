//! patctl (pat) - developer CLI for the platform acceptance toolkit
//!
//! Builds and inspects the synthetic buildpacks and app directories the
//! acceptance scenarios push, so they can be exercised by hand.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable with `--format json`.
fn init_tracing() {
    let fallback = std::env::var("PAT_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
