//! Logged-in CLI contexts.

use pat_id::{OrgName, SpaceName};
use pat_testing::TimeoutTier;
use tempfile::TempDir;
use tracing::info;

use crate::error::CfError;
use crate::runner::Cf;
use crate::session::Session;

/// Who the CLI acts as, and where.
#[derive(Clone)]
pub struct UserContext {
    pub api: String,
    pub username: String,
    pub password: String,
    pub org: OrgName,
    pub space: SpaceName,
    pub skip_ssl_validation: bool,
}

impl std::fmt::Debug for UserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserContext")
            .field("api", &self.api)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("org", &self.org)
            .field("space", &self.space)
            .field("skip_ssl_validation", &self.skip_ssl_validation)
            .finish()
    }
}

impl UserContext {
    /// Arguments of `cf api`.
    #[must_use]
    pub fn api_args(&self) -> Vec<String> {
        let mut args = vec!["api".to_string(), self.api.clone()];
        if self.skip_ssl_validation {
            args.push("--skip-ssl-validation".to_string());
        }
        args
    }

    /// Arguments of `cf target`.
    #[must_use]
    pub fn target_args(&self) -> Vec<String> {
        vec![
            "target".to_string(),
            "-o".to_string(),
            self.org.to_string(),
            "-s".to_string(),
            self.space.to_string(),
        ]
    }
}

/// A private `CF_HOME` holding one login.
///
/// Scenarios never share CLI state: each gets its own home directory, removed
/// when this value is dropped.
#[derive(Debug)]
pub struct CfHome {
    dir: TempDir,
    cf: Cf,
}

impl CfHome {
    /// Creates an empty home and a runner bound to it.
    pub fn create(base: &Cf) -> Result<Self, CfError> {
        let dir = tempfile::Builder::new()
            .prefix("cf-home")
            .tempdir()
            .map_err(CfError::Home)?;
        let cf = base.clone().with_home(dir.path());
        Ok(Self { dir, cf })
    }

    #[must_use]
    pub fn cf(&self) -> &Cf {
        &self.cf
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Cf {
    /// Points the CLI at the API and authenticates; does not target.
    pub async fn login(&self, ctx: &UserContext) -> Result<(), CfError> {
        self.run_ok(ctx.api_args(), TimeoutTier::Default).await?;
        self.run_ok(
            ["auth", ctx.username.as_str(), ctx.password.as_str()],
            TimeoutTier::Default,
        )
        .await?;
        info!(api = %ctx.api, user = %ctx.username, "logged in");
        Ok(())
    }

    /// Targets the context's org and space.
    pub async fn target(&self, ctx: &UserContext) -> Result<(), CfError> {
        self.run_ok(ctx.target_args(), TimeoutTier::Default).await?;
        Ok(())
    }

    /// Runs a command that must exit 0.
    pub async fn run_ok<I, S>(&self, args: I, tier: TimeoutTier) -> Result<Session, CfError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let session = self.run(args, tier).await?;
        if session.success() {
            Ok(session)
        } else {
            Err(CfError::CommandFailed {
                command: session.command_line(),
                exit: session.exit,
                output: session.output(),
            })
        }
    }
}
