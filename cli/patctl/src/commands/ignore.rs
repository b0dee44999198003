//! Upload preview commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use pat_testing::AppDirectory;
use serde::Serialize;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

/// Ignore-list commands.
#[derive(Debug, Args)]
pub struct IgnoreCommand {
    #[command(subcommand)]
    command: IgnoreSubcommand,
}

#[derive(Debug, Subcommand)]
enum IgnoreSubcommand {
    /// List the files a push of DIR would upload, honoring its .cfignore.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// App directory. Defaults to the current directory.
    #[arg(value_name = "DIR", default_value = ".")]
    dir: PathBuf,
}

#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    #[tabled(rename = "PATH")]
    path: String,
}

impl IgnoreCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            IgnoreSubcommand::Check(args) => check_ignore(ctx, args),
        }
    }
}

fn check_ignore(ctx: CommandContext, args: CheckArgs) -> Result<()> {
    let dir = AppDirectory::open(args.dir)?;
    let rows: Vec<FileRow> = dir
        .packaged_files()?
        .into_iter()
        .map(|path| FileRow { path })
        .collect();
    print_output(&rows, ctx.format);
    Ok(())
}
