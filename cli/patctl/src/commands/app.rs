//! App directory commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use pat_id::{marker_filename, AppName};
use pat_testing::app::FILLER_FILE;
use pat_testing::{AppDirectory, IgnoreList};
use serde::Serialize;

use crate::error::CliError;
use crate::output::{print_info, print_single, print_success, OutputFormat};

use super::CommandContext;

/// App directory commands.
#[derive(Debug, Args)]
pub struct AppCommand {
    #[command(subcommand)]
    command: AppSubcommand,
}

#[derive(Debug, Subcommand)]
enum AppSubcommand {
    /// Create (or reuse) a directory carrying the app's marker file.
    Create(CreateArgs),
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// App name the marker is derived from.
    #[arg(long)]
    app: String,

    /// Directory to populate; created if missing.
    #[arg(long, value_name = "DIR")]
    dir: PathBuf,

    /// Size of a sparse filler file, in bytes.
    #[arg(long, value_name = "BYTES")]
    filler_bytes: Option<u64>,

    /// Write a .cfignore with this pattern. Repeatable.
    #[arg(long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreatedApp {
    dir: PathBuf,
    marker: String,
    files: Vec<String>,
}

impl AppCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AppSubcommand::Create(args) => create_app(ctx, args),
        }
    }
}

fn create_app(ctx: CommandContext, args: CreateArgs) -> Result<()> {
    let app = AppName::new(args.app.as_str())
        .map_err(|e| CliError::InvalidArgument(format!("--app: {e}")))?;
    let marker = marker_filename(&app);

    let dir = AppDirectory::create_at(&args.dir)?;
    dir.write_marker(&marker)
        .with_context(|| format!("failed to populate {}", args.dir.display()))?;
    if let Some(bytes) = args.filler_bytes {
        dir.add_file(FILLER_FILE, bytes)?;
    }
    if !args.ignore.is_empty() {
        dir.write_ignore(&IgnoreList::new(&args.ignore))?;
    }

    let created = CreatedApp {
        dir: args.dir,
        marker: marker.to_string(),
        files: dir.packaged_files()?,
    };
    match ctx.format {
        OutputFormat::Json => print_single(&created),
        OutputFormat::Table => {
            print_success(&format!("Populated {}", created.dir.display()));
            print_info(&format!("marker: {}", created.marker));
            print_info(&format!("files pushed: {}", created.files.len()));
        }
    }
    Ok(())
}
