//! One acceptance scenario: an app, its buildpack, and guaranteed cleanup.

use std::future::Future;
use std::sync::{Arc, Mutex};

use pat_id::{AppName, BuildpackName, OrgName, ServiceName};
use pat_testing::{with_teardown, AppDirectory, FixtureDescriptor, TeardownError, TeardownLog};
use tracing::info;

use crate::error::CfError;
use crate::platform::Platform;

/// Resources a scenario promised to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Tracked {
    App(AppName),
    Buildpack(BuildpackName),
    Service(ServiceName),
    Org(OrgName),
}

#[derive(Debug)]
struct Inner {
    app: AppName,
    buildpack: BuildpackName,
    dir: AppDirectory,
    platform: Platform,
    tracked: Mutex<Vec<Tracked>>,
}

/// A fresh app name, buildpack name and app directory, plus the list of
/// platform resources to delete afterwards.
///
/// The scenario's own app and buildpack are tracked from the start; deleting
/// them is harmless if the body never created them.
#[derive(Debug, Clone)]
pub struct Scenario {
    inner: Arc<Inner>,
}

impl Scenario {
    pub fn new(platform: Platform) -> Result<Self, CfError> {
        Self::with_names(platform, AppName::random(), BuildpackName::random())
    }

    pub fn with_names(
        platform: Platform,
        app: AppName,
        buildpack: BuildpackName,
    ) -> Result<Self, CfError> {
        let dir = AppDirectory::create()?;
        let tracked = vec![Tracked::App(app.clone()), Tracked::Buildpack(buildpack.clone())];
        Ok(Self {
            inner: Arc::new(Inner {
                app,
                buildpack,
                dir,
                platform,
                tracked: Mutex::new(tracked),
            }),
        })
    }

    #[must_use]
    pub fn app(&self) -> &AppName {
        &self.inner.app
    }

    #[must_use]
    pub fn buildpack(&self) -> &BuildpackName {
        &self.inner.buildpack
    }

    #[must_use]
    pub fn dir(&self) -> &AppDirectory {
        &self.inner.dir
    }

    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.inner.platform
    }

    /// Descriptor pairing this scenario's buildpack with its app.
    #[must_use]
    pub fn descriptor(&self, version: impl Into<String>) -> FixtureDescriptor {
        FixtureDescriptor::for_app(self.inner.buildpack.clone(), &self.inner.app, version)
    }

    /// Installs the scenario's buildpack and writes the app's marker.
    pub async fn install(&self, descriptor: &FixtureDescriptor) -> Result<(), CfError> {
        self.inner.platform.install_fixture(descriptor).await?;
        self.track_buildpack(descriptor.name.clone());
        self.inner.dir.write_marker(&descriptor.marker)?;
        Ok(())
    }

    pub fn track_app(&self, app: AppName) {
        self.track(Tracked::App(app));
    }

    pub fn track_buildpack(&self, buildpack: BuildpackName) {
        self.track(Tracked::Buildpack(buildpack));
    }

    pub fn track_service(&self, service: ServiceName) {
        self.track(Tracked::Service(service));
    }

    /// Deletes the whole org once everything else is gone.
    pub fn track_org(&self, org: OrgName) {
        self.track(Tracked::Org(org));
    }

    fn track(&self, resource: Tracked) {
        let mut tracked = match self.inner.tracked.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !tracked.contains(&resource) {
            tracked.push(resource);
        }
    }

    /// Runs `body`, then deletes every tracked resource.
    ///
    /// A body error is returned first; otherwise a dirty teardown becomes
    /// the error. A panicking body still gets its teardown, then the panic
    /// resumes.
    pub async fn run<F, Fut, T, E>(self, body: F) -> Result<T, E>
    where
        F: FnOnce(Scenario) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TeardownError>,
    {
        let cleanup = self.clone();
        let (result, log) = with_teardown(body(self), cleanup.teardown()).await;
        let value = result?;
        log.into_result()?;
        Ok(value)
    }

    /// Deletes tracked resources: apps first, so bound services can go, then
    /// services, buildpacks and finally orgs.
    pub async fn teardown(&self) -> TeardownLog {
        let tracked = match self.inner.tracked.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let platform = &self.inner.platform;
        let mut log = TeardownLog::new();

        for resource in &tracked {
            if let Tracked::App(app) = resource {
                log.record(&format!("delete app {app}"), platform.delete_app(app).await);
            }
        }
        for resource in &tracked {
            if let Tracked::Service(service) = resource {
                log.record(
                    &format!("delete service {service}"),
                    platform.delete_service(service).await,
                );
            }
        }
        for resource in &tracked {
            if let Tracked::Buildpack(buildpack) = resource {
                log.record(
                    &format!("delete buildpack {buildpack}"),
                    platform.delete_buildpack(buildpack).await,
                );
            }
        }
        for resource in &tracked {
            if let Tracked::Org(org) = resource {
                log.record(&format!("delete org {org}"), platform.delete_org(org).await);
            }
        }

        info!(
            app = %self.inner.app,
            resources = tracked.len(),
            failures = log.failures().len(),
            "scenario torn down"
        );
        log
    }
}
