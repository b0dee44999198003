//! Administrative platform operations used by fixtures and teardown.

use std::path::Path;

use pat_id::{AppName, BuildpackName, OrgName, ServiceName, SpaceName};
use pat_testing::{BuildpackArchive, FixtureDescriptor, TimeoutTier};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::context::UserContext;
use crate::error::CfError;
use crate::push::PushArgs;
use crate::runner::Cf;
use crate::session::Session;

/// Output `create-buildpack` prints on success, in order.
pub const CREATE_BUILDPACK_SAYS: &[&str] = &["Creating", "OK", "Uploading", "OK"];

/// Output `update-buildpack` prints on success, in order.
pub const UPDATE_BUILDPACK_SAYS: &[&str] = &["Done uploading", "OK"];

/// `GET /v2/apps?q=name:<name>` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppsResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub resources: Vec<Resource<AppEntity>>,
}

/// `GET /v2/buildpacks` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildpacksResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub resources: Vec<Resource<BuildpackEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppEntity {
    pub name: String,
    #[serde(default)]
    pub detected_buildpack: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildpackEntity {
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub filename: Option<String>,
}

impl BuildpacksResponse {
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&BuildpackEntity> {
        self.resources
            .iter()
            .map(|r| &r.entity)
            .find(|b| b.name == name)
    }
}

impl AppsResponse {
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&AppEntity> {
        self.resources
            .iter()
            .map(|r| &r.entity)
            .find(|a| a.name == name)
    }
}

/// Platform operations through one logged-in CLI.
#[derive(Debug, Clone)]
pub struct Platform {
    cf: Cf,
}

impl Platform {
    pub fn new(cf: Cf) -> Self {
        Self { cf }
    }

    #[must_use]
    pub fn cf(&self) -> &Cf {
        &self.cf
    }

    /// Creates the context's org and space (if missing) and targets them.
    pub async fn prepare_space(&self, ctx: &UserContext) -> Result<(), CfError> {
        self.cf
            .run_ok(["create-org", ctx.org.as_str()], TimeoutTier::Default)
            .await?;
        self.cf
            .run_ok(
                ["create-space", ctx.space.as_str(), "-o", ctx.org.as_str()],
                TimeoutTier::Default,
            )
            .await?;
        self.cf.target(ctx).await?;
        info!(org = %ctx.org, space = %ctx.space, "space ready");
        Ok(())
    }

    /// Deletes an org and everything in it.
    pub async fn delete_org(&self, org: &OrgName) -> Result<(), CfError> {
        self.cf
            .run_ok(["delete-org", org.as_str(), "-f"], TimeoutTier::Long)
            .await?;
        Ok(())
    }

    /// Creates a space in `org`; the output is returned for assertions.
    pub async fn create_space(&self, space: &SpaceName, org: &OrgName) -> Result<Session, CfError> {
        self.cf
            .run(
                ["create-space", space.as_str(), "-o", org.as_str()],
                TimeoutTier::Default,
            )
            .await
    }

    /// Registers a buildpack archive at `position`.
    pub async fn create_buildpack(
        &self,
        archive: &Path,
        name: &BuildpackName,
        position: u32,
    ) -> Result<Session, CfError> {
        let position = position.to_string();
        let archive = archive.display().to_string();
        let session = self
            .cf
            .run_ok(
                ["create-buildpack", name.as_str(), archive.as_str(), position.as_str()],
                TimeoutTier::Default,
            )
            .await?;
        expect_says(&session, CREATE_BUILDPACK_SAYS)?;
        info!(buildpack = %name, position = %position, "buildpack created");
        Ok(session)
    }

    /// Replaces the bits of a registered buildpack.
    pub async fn update_buildpack(
        &self,
        name: &BuildpackName,
        archive: &Path,
    ) -> Result<Session, CfError> {
        let archive = archive.display().to_string();
        let session = self
            .cf
            .run_ok(
                ["update-buildpack", name.as_str(), "-p", archive.as_str()],
                TimeoutTier::Default,
            )
            .await?;
        expect_says(&session, UPDATE_BUILDPACK_SAYS)?;
        info!(buildpack = %name, "buildpack updated");
        Ok(session)
    }

    pub async fn delete_buildpack(&self, name: &BuildpackName) -> Result<(), CfError> {
        self.cf
            .run_ok(["delete-buildpack", name.as_str(), "-f"], TimeoutTier::Default)
            .await?;
        info!(buildpack = %name, "buildpack deleted");
        Ok(())
    }

    pub async fn delete_app(&self, name: &AppName) -> Result<(), CfError> {
        self.cf
            .run_ok(["delete", name.as_str(), "-f"], TimeoutTier::Default)
            .await?;
        Ok(())
    }

    pub async fn delete_service(&self, name: &ServiceName) -> Result<(), CfError> {
        self.cf
            .run_ok(["delete-service", name.as_str(), "-f"], TimeoutTier::Default)
            .await?;
        Ok(())
    }

    /// Runs `cf push`; any exit status is returned as data.
    pub async fn push(&self, args: &PushArgs, tier: TimeoutTier) -> Result<Session, CfError> {
        self.cf.run(args.to_args(), tier).await
    }

    /// `cf logs --recent <app>`, which must succeed.
    pub async fn recent_logs(&self, app: &AppName) -> Result<Session, CfError> {
        self.cf
            .run_ok(["logs", "--recent", app.as_str()], TimeoutTier::Default)
            .await
    }

    /// Fetches `path` through `cf curl` and decodes the JSON body.
    pub async fn curl_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CfError> {
        let session = self.cf.run_ok(["curl", path], TimeoutTier::Default).await?;
        serde_json::from_str(&session.stdout).map_err(|source| CfError::Json {
            path: path.to_string(),
            source,
        })
    }

    pub async fn buildpacks(&self) -> Result<BuildpacksResponse, CfError> {
        self.curl_json("/v2/buildpacks").await
    }

    pub async fn app_by_name(&self, name: &AppName) -> Result<AppsResponse, CfError> {
        self.curl_json(&format!("/v2/apps?q=name:{name}")).await
    }

    /// Fails if an app called `name` is still registered.
    pub async fn ensure_app_not_registered(&self, name: &AppName) -> Result<(), CfError> {
        match self.app_by_name(name).await?.find(name.as_str()) {
            Some(_) => Err(CfError::StillRegistered {
                kind: "app",
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Fails if any of `names` is still registered as a buildpack.
    pub async fn ensure_buildpacks_not_registered(
        &self,
        names: &[BuildpackName],
    ) -> Result<(), CfError> {
        let registered = self.buildpacks().await?;
        match names.iter().find(|n| registered.find(n.as_str()).is_some()) {
            Some(name) => Err(CfError::StillRegistered {
                kind: "buildpack",
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Builds the descriptor's archive and registers it ahead of every
    /// other buildpack. The staging directory is removed afterwards.
    pub async fn install_fixture(&self, descriptor: &FixtureDescriptor) -> Result<(), CfError> {
        let archive = BuildpackArchive::build(descriptor)?;
        self.create_buildpack(archive.path(), &descriptor.name, 0)
            .await?;
        archive.close()?;
        Ok(())
    }

    /// Rebuilds the descriptor's archive and uploads it over the existing
    /// buildpack of the same name.
    pub async fn reinstall_fixture(&self, descriptor: &FixtureDescriptor) -> Result<(), CfError> {
        let archive = BuildpackArchive::build(descriptor)?;
        self.update_buildpack(&descriptor.name, archive.path())
            .await?;
        archive.close()?;
        Ok(())
    }
}

fn expect_says(session: &Session, needles: &[&str]) -> Result<(), CfError> {
    match session.first_unsaid(needles) {
        Some(index) => Err(CfError::UnexpectedOutput {
            command: session.command_line(),
            expected: needles[index].to_string(),
            output: session.output(),
        }),
        None => Ok(()),
    }
}
