//! Deployment manifests (`manifest.yml`).
//!
//! Scenarios write manifests next to their apps and check that command-line
//! flags win over them. [`resolve`] reproduces the `inherit:` layering so a
//! scenario can state what the platform should end up with.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or resolving manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to render manifest: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("manifest {} inherits from itself through its parents", .path.display())]
    InheritCycle { path: PathBuf },

    #[error("application #{index} has no name")]
    MissingName { index: usize },
}

/// A manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Parent manifest, relative to this manifest's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<AppManifest>,
}

/// One entry of `applications`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildpack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_quota: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(
        rename = "no-route",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub no_route: Option<bool>,
}

impl AppManifest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn buildpack(mut self, buildpack: impl Into<String>) -> Self {
        self.buildpack = Some(buildpack.into());
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
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn disk_quota(mut self, quota: impl Into<String>) -> Self {
        self.disk_quota = Some(quota.into());
        self
    }

    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    #[must_use]
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.services.get_or_insert_with(Vec::new).push(service.into());
        self
    }

    #[must_use]
    pub fn no_route(mut self, no_route: bool) -> Self {
        self.no_route = Some(no_route);
        self
    }

    /// Layers `child` over `self`: every attribute the child sets replaces
    /// the parent's attribute whole (maps and lists are not merged).
    #[must_use]
    pub fn overlay(self, child: AppManifest) -> AppManifest {
        AppManifest {
            name: child.name.or(self.name),
            path: child.path.or(self.path),
            buildpack: child.buildpack.or(self.buildpack),
            memory: child.memory.or(self.memory),
            instances: child.instances.or(self.instances),
            host: child.host.or(self.host),
            hosts: child.hosts.or(self.hosts),
            domain: child.domain.or(self.domain),
            timeout: child.timeout.or(self.timeout),
            disk_quota: child.disk_quota.or(self.disk_quota),
            command: child.command.or(self.command),
            env: child.env.or(self.env),
            services: child.services.or(self.services),
            no_route: child.no_route.or(self.no_route),
        }
    }
}

impl Manifest {
    /// Manifest with the given applications and no parent.
    pub fn with_apps(applications: impl IntoIterator<Item = AppManifest>) -> Self {
        Self {
            inherit: None,
            applications: applications.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn inherit(mut self, parent: impl Into<String>) -> Self {
        self.inherit = Some(parent.into());
        self
    }

    /// Renders the YAML document, starting with `---`.
    pub fn render(&self) -> Result<String, ManifestError> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("---\n{body}"))
    }

    /// Parses a YAML document.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ManifestError> {
        serde_yaml::from_str(contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads and parses a manifest file, without following `inherit`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Looks up an application by name.
    #[must_use]
    pub fn app(&self, name: &str) -> Option<&AppManifest> {
        self.applications
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
    }

    /// Checks that every application is named.
    pub fn validate(&self) -> Result<(), ManifestError> {
        match self.applications.iter().position(|a| a.name.is_none()) {
            Some(index) => Err(ManifestError::MissingName { index }),
            None => Ok(()),
        }
    }

    /// Layers `child` over `self` (the parent).
    ///
    /// Applications are paired by name; the child's come first, parent-only
    /// applications follow in their original order.
    #[must_use]
    pub fn merge(self, child: Manifest) -> Manifest {
        let mut parents: Vec<Option<AppManifest>> =
            self.applications.into_iter().map(Some).collect();
        let mut applications = Vec::new();

        for app in child.applications {
            let parent = app.name.as_deref().and_then(|name| {
                parents
                    .iter_mut()
                    .find(|p| p.as_ref().and_then(|p| p.name.as_deref()) == Some(name))
                    .and_then(Option::take)
            });
            applications.push(match parent {
                Some(parent) => parent.overlay(app),
                None => app,
            });
        }
        applications.extend(parents.into_iter().flatten());

        Manifest {
            inherit: None,
            applications,
        }
    }
}

/// Loads `path` and folds in every manifest it inherits from.
pub fn resolve(path: &Path) -> Result<Manifest, ManifestError> {
    let mut seen = HashSet::new();
    let mut chain = Vec::new();
    let mut current = path.to_path_buf();

    loop {
        let canonical = fs::canonicalize(&current).map_err(|source| ManifestError::Read {
            path: current.clone(),
            source,
        })?;
        if !seen.insert(canonical.clone()) {
            return Err(ManifestError::InheritCycle {
                path: path.to_path_buf(),
            });
        }

        let manifest = Manifest::load(&canonical)?;
        let parent = manifest.inherit.as_ref().map(|p| {
            canonical
                .parent()
                .map(|dir| dir.join(p))
                .unwrap_or_else(|| PathBuf::from(p))
        });
        chain.push(manifest);

        match parent {
            Some(parent) => current = parent,
            None => break,
        }
    }

    let mut merged = chain.pop().unwrap_or_default();
    merged.inherit = None;
    while let Some(child) = chain.pop() {
        merged = merged.merge(child);
    }
    Ok(merged)
}
