//! Typed `cf push` invocations.

use std::path::{Path, PathBuf};

/// Arguments of one `cf push`.
///
/// Flags render in a fixed order regardless of how the builder was called,
/// so two equal values always produce the same command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushArgs {
    app: Option<String>,
    path: Option<PathBuf>,
    buildpack: Option<String>,
    memory: Option<String>,
    instances: Option<u32>,
    disk_quota: Option<String>,
    timeout: Option<u32>,
    host: Option<String>,
    no_route: bool,
    no_start: bool,
    manifest: Option<PathBuf>,
    command: Option<String>,
}

impl PushArgs {
    /// Push of a named app.
    pub fn app(name: impl AsRef<str>) -> Self {
        Self {
            app: Some(name.as_ref().to_string()),
            ..Self::default()
        }
    }

    /// Push driven only by a manifest (`-f`).
    pub fn manifest(path: impl Into<PathBuf>) -> Self {
        Self {
            manifest: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn buildpack(mut self, buildpack: impl AsRef<str>) -> Self {
        self.buildpack = Some(buildpack.as_ref().to_string());
        self
    }

    #[must_use]
    pub fn memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    #[must_use]
    pub fn instances(mut self, instances: u32) -> Self {
        self.instances = Some(instances);
        self
    }

    #[must_use]
    pub fn disk_quota(mut self, quota: impl Into<String>) -> Self {
        self.disk_quota = Some(quota.into());
        self
    }

    /// Health-check timeout in seconds (`-t`).
    #[must_use]
    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl AsRef<str>) -> Self {
        self.host = Some(host.as_ref().to_string());
        self
    }

    #[must_use]
    pub fn no_route(mut self) -> Self {
        self.no_route = true;
        self
    }

    #[must_use]
    pub fn no_start(mut self) -> Self {
        self.no_start = true;
        self
    }

    #[must_use]
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    /// Start command overriding the buildpack's (`-c`).
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Full argument list, starting with `push`.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["push".to_string()];
        args.extend(self.app.clone());
        push_flag(&mut args, "-p", self.path.as_ref().map(|p| p.display().to_string()));
        push_flag(&mut args, "-b", self.buildpack.clone());
        push_flag(&mut args, "-m", self.memory.clone());
        push_flag(&mut args, "-i", self.instances.map(|n| n.to_string()));
        push_flag(&mut args, "-k", self.disk_quota.clone());
        push_flag(&mut args, "-t", self.timeout.map(|n| n.to_string()));
        push_flag(&mut args, "-n", self.host.clone());
        if self.no_route {
            args.push("--no-route".to_string());
        }
        if self.no_start {
            args.push("--no-start".to_string());
        }
        push_flag(&mut args, "-f", self.manifest.as_ref().map(|p| p.display().to_string()));
        push_flag(&mut args, "-c", self.command.clone());
        args
    }
}

fn push_flag(args: &mut Vec<String>, name: &str, value: Option<String>) {
    if let Some(value) = value {
        args.push(name.to_string());
        args.push(value);
    }
}
