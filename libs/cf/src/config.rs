//! Configuration for acceptance runs.

use std::path::PathBuf;
use std::time::Duration;

use pat_id::{OrgName, SpaceName};
use pat_testing::TimeoutTier;

use crate::context::UserContext;
use crate::error::CfError;

/// Smallest accepted `PAT_TIMEOUT_SCALE`.
pub const MIN_TIMEOUT_SCALE: f64 = 0.1;

/// Acceptance run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API endpoint of the platform under test.
    pub api: Option<String>,

    /// Shared domain pushed apps are routed under.
    pub apps_domain: Option<String>,

    /// Admin user that registers buildpacks.
    pub admin_user: String,

    pub admin_password: Option<String>,

    /// Org and space the run targets; random unless pinned.
    pub org: OrgName,
    pub space: SpaceName,

    /// Pass `--skip-ssl-validation` to `cf api` and accept invalid app certs.
    pub skip_ssl_validation: bool,

    /// Probe apps over plain HTTP instead of HTTPS.
    pub use_http: bool,

    /// CLI binary to run.
    pub cf_binary: PathBuf,

    /// Multiplier applied to every timeout tier.
    pub timeout_scale: f64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, CfError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false)
        };

        let org = match non_empty("PAT_ORG") {
            Some(raw) => OrgName::new(raw).map_err(|e| CfError::InvalidConfig {
                var: "PAT_ORG",
                message: e.to_string(),
            })?,
            None => OrgName::random(),
        };
        let space = match non_empty("PAT_SPACE") {
            Some(raw) => SpaceName::new(raw).map_err(|e| CfError::InvalidConfig {
                var: "PAT_SPACE",
                message: e.to_string(),
            })?,
            None => SpaceName::random(),
        };

        let timeout_scale = match non_empty("PAT_TIMEOUT_SCALE") {
            Some(raw) => {
                let scale: f64 = raw.trim().parse().map_err(|_| CfError::InvalidConfig {
                    var: "PAT_TIMEOUT_SCALE",
                    message: format!("{raw:?} is not a number"),
                })?;
                if !scale.is_finite() || scale < MIN_TIMEOUT_SCALE {
                    return Err(CfError::InvalidConfig {
                        var: "PAT_TIMEOUT_SCALE",
                        message: format!("must be at least {MIN_TIMEOUT_SCALE}, got {scale}"),
                    });
                }
                scale
            }
            None => 1.0,
        };

        Ok(Self {
            api: non_empty("PAT_API"),
            apps_domain: non_empty("PAT_APPS_DOMAIN"),
            admin_user: non_empty("PAT_ADMIN_USER").unwrap_or_else(|| "admin".to_string()),
            admin_password: non_empty("PAT_ADMIN_PASSWORD"),
            org,
            space,
            skip_ssl_validation: flag("PAT_SKIP_SSL_VALIDATION"),
            use_http: flag("PAT_USE_HTTP"),
            cf_binary: non_empty("PAT_CF_BINARY")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cf")),
            timeout_scale,
            log_level: non_empty("PAT_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// True when everything a live scenario needs is configured.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.api.is_some() && self.apps_domain.is_some() && self.admin_password.is_some()
    }

    /// Timeout of `tier` under this run's scale.
    #[must_use]
    pub fn timeout(&self, tier: TimeoutTier) -> Duration {
        tier.scaled(self.timeout_scale)
    }

    /// Scheme used for app probes.
    #[must_use]
    pub fn app_scheme(&self) -> &'static str {
        if self.use_http {
            "http"
        } else {
            "https"
        }
    }

    pub fn apps_domain(&self) -> Result<&str, CfError> {
        self.apps_domain
            .as_deref()
            .ok_or(CfError::NotConfigured {
                var: "PAT_APPS_DOMAIN",
            })
    }

    /// Admin credentials targeting the run's org and space.
    pub fn admin_context(&self) -> Result<UserContext, CfError> {
        let api = self
            .api
            .clone()
            .ok_or(CfError::NotConfigured { var: "PAT_API" })?;
        let password = self
            .admin_password
            .clone()
            .ok_or(CfError::NotConfigured {
                var: "PAT_ADMIN_PASSWORD",
            })?;
        Ok(UserContext {
            api,
            username: self.admin_user.clone(),
            password,
            org: self.org.clone(),
            space: self.space.clone(),
            skip_ssl_validation: self.skip_ssl_validation,
        })
    }
}
