//! `pat await`: block until a URL serves some text.

use std::convert::Infallible;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use pat_cf::AppClient;
use pat_testing::Eventually;
use serde::Serialize;

use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct AwaitArgs {
    /// URL to GET.
    url: String,

    /// Text the response body must contain.
    #[arg(long)]
    contains: String,

    /// Give up after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Pause between requests, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    interval_ms: u64,

    /// Accept invalid TLS certificates.
    #[arg(long)]
    skip_ssl_validation: bool,
}

#[derive(Debug, Serialize)]
struct AwaitResult {
    url: String,
    waited_ms: u128,
    body: String,
}

pub async fn run(ctx: CommandContext, args: AwaitArgs) -> Result<()> {
    let client =
        AppClient::for_urls(args.skip_ssl_validation).context("failed to build HTTP client")?;
    let policy = Eventually::new(Duration::from_secs(args.timeout))
        .interval(Duration::from_millis(args.interval_ms));

    let started = tokio::time::Instant::now();
    let url = args.url.as_str();
    let body = policy
        .until(
            || {
                let client = client.clone();
                async move { Ok::<_, Infallible>(client.fetch_url(url).await) }
            },
            |body: &String| body.contains(&args.contains),
        )
        .await?;

    let result = AwaitResult {
        url: args.url.clone(),
        waited_ms: started.elapsed().as_millis(),
        body,
    };
    match ctx.format {
        OutputFormat::Json => print_single(&result),
        OutputFormat::Table => {
            print_success(&format!(
                "{} contains {:?} after {}ms",
                result.url, args.contains, result.waited_ms
            ));
        }
    }
    Ok(())
}

