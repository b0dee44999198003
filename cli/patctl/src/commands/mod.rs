//! CLI commands.

mod app;
mod await_cmd;
mod fixture;
mod ignore;
mod manifest;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// pat - build and inspect platform acceptance fixtures.
#[derive(Debug, Parser)]
#[command(name = "pat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build, inspect, render or install synthetic buildpacks.
    Fixture(fixture::FixtureCommand),

    /// Create app directories a fixture buildpack will detect.
    App(app::AppCommand),

    /// Work with app manifests (offline).
    Manifest(manifest::ManifestCommand),

    /// Preview which files a push would upload.
    Ignore(ignore::IgnoreCommand),

    /// Poll a URL until its body contains some text.
    Await(await_cmd::AwaitArgs),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let ctx = CommandContext {
            format: OutputFormat::parse(&self.format),
        };

        match self.command {
            Commands::Fixture(cmd) => cmd.run(ctx).await,
            Commands::App(cmd) => cmd.run(ctx).await,
            Commands::Manifest(cmd) => cmd.run(ctx).await,
            Commands::Ignore(cmd) => cmd.run(ctx).await,
            Commands::Await(args) => await_cmd::run(ctx, args).await,
            Commands::Version => {
                println!("pat {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub format: OutputFormat,
}
