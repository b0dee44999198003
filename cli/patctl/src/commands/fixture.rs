//! Fixture buildpack commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use pat_cf::{Cf, CfHome, Config, Platform};
use pat_id::{random_version, AppName, BuildpackName};
use pat_testing::archive::{archive_file_name, verify_archive};
use pat_testing::{build_fixture_archive, FixtureDescriptor, FixtureError, ReleaseVariant};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_info, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Fixture commands.
#[derive(Debug, Args)]
pub struct FixtureCommand {
    #[command(subcommand)]
    command: FixtureSubcommand,
}

#[derive(Debug, Subcommand)]
enum FixtureSubcommand {
    /// Write a buildpack zip that detects only the given app.
    Build(BuildArgs),

    /// List the entries of a buildpack zip.
    Inspect(InspectArgs),

    /// Print one rendered buildpack script.
    Render(RenderArgs),

    /// Build a buildpack and register it on the configured platform.
    Install(InstallArgs),
}

/// What the buildpack looks like.
#[derive(Debug, Args)]
struct DescriptorArgs {
    /// App the buildpack should detect.
    #[arg(long)]
    app: String,

    /// Version echoed at staging and by the web process. Random if omitted.
    #[arg(long = "version", value_name = "VERSION")]
    fixture_version: Option<String>,

    /// Buildpack name. Random if omitted.
    #[arg(long)]
    buildpack: Option<String>,

    /// Seconds the compile step sleeps.
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// Dump this variable after the standard set in the page body. Repeatable.
    #[arg(long = "env", value_name = "VAR", conflicts_with = "crash_after")]
    env: Vec<String>,

    /// Dump the standard variables in the page body.
    #[arg(long, conflicts_with = "crash_after")]
    env_dump: bool,

    /// Kill the web process once it has been up this many seconds.
    #[arg(long, value_name = "SECS")]
    crash_after: Option<u64>,
}

impl DescriptorArgs {
    fn descriptor(&self) -> Result<FixtureDescriptor> {
        let app = AppName::new(self.app.as_str())
            .map_err(|e| CliError::InvalidArgument(format!("--app: {e}")))?;
        let name = match &self.buildpack {
            Some(raw) => BuildpackName::new(raw.as_str())
                .map_err(|e| CliError::InvalidArgument(format!("--buildpack: {e}")))?,
            None => BuildpackName::random(),
        };
        let version = self.fixture_version.clone().unwrap_or_else(random_version);

        let release = if let Some(secs) = self.crash_after {
            ReleaseVariant::CrashAfter(secs)
        } else if self.env_dump || !self.env.is_empty() {
            ReleaseVariant::standard_env_with(self.env.iter().cloned())
        } else {
            ReleaseVariant::Static
        };

        let descriptor = FixtureDescriptor::for_app(name, &app, version)
            .with_startup_delay(self.delay)
            .with_release(release);
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[derive(Debug, Args)]
struct BuildArgs {
    #[command(flatten)]
    descriptor: DescriptorArgs,

    /// Output zip path. Defaults to ./buildpack_<version>.zip.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Buildpack zip to read.
    archive: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Script {
    Compile,
    Detect,
    Release,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    descriptor: DescriptorArgs,

    /// Which script to print.
    #[arg(value_enum)]
    script: Script,
}

#[derive(Debug, Args)]
struct InstallArgs {
    #[command(flatten)]
    descriptor: DescriptorArgs,

    /// Upload over an existing buildpack of the same name instead of
    /// creating one.
    #[arg(long, requires = "buildpack")]
    update: bool,
}

/// Summary of a built or installed fixture.
#[derive(Debug, Serialize)]
struct FixtureSummary {
    buildpack: String,
    version: String,
    marker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive: Option<PathBuf>,
}

impl FixtureSummary {
    fn new(descriptor: &FixtureDescriptor, archive: Option<&Path>) -> Self {
        Self {
            buildpack: descriptor.name.to_string(),
            version: descriptor.version.clone(),
            marker: descriptor.marker.to_string(),
            archive: archive.map(Path::to_path_buf),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "MODE")]
    mode: String,
    #[tabled(rename = "SIZE")]
    size: u64,
    #[tabled(rename = "SHA256")]
    sha256: String,
}

impl FixtureCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            FixtureSubcommand::Build(args) => build_fixture(ctx, args),
            FixtureSubcommand::Inspect(args) => inspect_fixture(ctx, args),
            FixtureSubcommand::Render(args) => render_script(ctx, args),
            FixtureSubcommand::Install(args) => install_fixture(ctx, args).await,
        }
    }
}

fn build_fixture(ctx: CommandContext, args: BuildArgs) -> Result<()> {
    let descriptor = args.descriptor.descriptor()?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(archive_file_name(&descriptor.version)));
    build_fixture_archive(&descriptor, &output)
        .with_context(|| format!("failed to build {}", output.display()))?;

    let summary = FixtureSummary::new(&descriptor, Some(&output));
    match ctx.format {
        OutputFormat::Json => print_single(&summary),
        OutputFormat::Table => {
            print_success(&format!("Wrote {}", output.display()));
            print_info(&format!("buildpack: {}", summary.buildpack));
            print_info(&format!("version: {}", summary.version));
            print_info(&format!("marker: {}", summary.marker));
        }
    }
    Ok(())
}

fn inspect_fixture(ctx: CommandContext, args: InspectArgs) -> Result<()> {
    let entries = verify_archive(&args.archive).map_err(|e| match e {
        FixtureError::MissingEntry { path, entry } => CliError::NotAFixture {
            path: path.display().to_string(),
            entry,
        }
        .into(),
        other => anyhow::Error::new(other),
    })?;

    let rows: Vec<EntryRow> = entries
        .into_iter()
        .map(|e| EntryRow {
            path: e.path,
            mode: e.mode.map_or_else(|| "-".to_string(), |m| format!("{m:04o}")),
            size: e.size,
            sha256: e.sha256,
        })
        .collect();
    print_output(&rows, ctx.format);
    Ok(())
}

fn render_script(ctx: CommandContext, args: RenderArgs) -> Result<()> {
    let descriptor = args.descriptor.descriptor()?;
    let scripts = descriptor.scripts()?;
    let body = match args.script {
        Script::Compile => scripts.compile,
        Script::Detect => scripts.detect,
        Script::Release => scripts.release,
    };

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "buildpack": descriptor.name.to_string(),
            "version": descriptor.version,
            "script": body,
        })),
        OutputFormat::Table => print!("{body}"),
    }
    Ok(())
}

async fn install_fixture(ctx: CommandContext, args: InstallArgs) -> Result<()> {
    let descriptor = args.descriptor.descriptor()?;
    let config = Config::from_env()?;
    let admin = config.admin_context()?;

    let home = CfHome::create(&Cf::from_config(&config))?;
    home.cf().login(&admin).await?;
    let platform = Platform::new(home.cf().clone());
    if args.update {
        platform.reinstall_fixture(&descriptor).await?;
    } else {
        platform.install_fixture(&descriptor).await?;
    }

    let summary = FixtureSummary::new(&descriptor, None);
    match ctx.format {
        OutputFormat::Json => print_single(&summary),
        OutputFormat::Table => {
            let verb = if args.update { "Updated" } else { "Installed" };
            print_success(&format!("{verb} buildpack {}", summary.buildpack));
            print_info(&format!("push an app containing {} to match it", summary.marker));
        }
    }
    Ok(())
}
