//! Manifest commands.
//!
//! These commands operate purely on local manifest files (offline).

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use pat_testing::manifest;

use crate::output::{print_single, OutputFormat};

use super::CommandContext;

/// Manifest commands.
#[derive(Debug, Args)]
pub struct ManifestCommand {
    #[command(subcommand)]
    command: ManifestSubcommand,
}

#[derive(Debug, Subcommand)]
enum ManifestSubcommand {
    /// Print a manifest with its `inherit` chain folded in.
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Manifest file path. Defaults to ./manifest.yml.
    #[arg(value_name = "PATH")]
    manifest: Option<PathBuf>,
}

impl ManifestCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ManifestSubcommand::Resolve(args) => resolve_manifest(ctx, args),
        }
    }
}

fn resolve_manifest(ctx: CommandContext, args: ResolveArgs) -> Result<()> {
    let path = args.manifest.unwrap_or_else(|| PathBuf::from("manifest.yml"));
    let resolved = manifest::resolve(&path)?;
    resolved.validate()?;

    match ctx.format {
        OutputFormat::Json => print_single(&resolved),
        OutputFormat::Table => print!("{}", resolved.render()?),
    }
    Ok(())
}
