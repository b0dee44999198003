//! HTTP probes against pushed apps.

use std::convert::Infallible;
use std::time::Duration;

use pat_testing::{Eventually, PollError};
use tracing::debug;

use crate::config::Config;
use crate::error::CfError;

/// Per-request timeout for app probes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches pages from apps routed under the shared apps domain.
#[derive(Debug, Clone)]
pub struct AppClient {
    client: reqwest::Client,
    scheme: &'static str,
    apps_domain: String,
}

impl AppClient {
    /// Create a client for `apps_domain`.
    pub fn new(
        apps_domain: impl Into<String>,
        use_http: bool,
        skip_ssl_validation: bool,
    ) -> Result<Self, CfError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_ssl_validation)
            .build()
            .map_err(|source| CfError::Http {
                url: String::from("(client setup)"),
                source,
            })?;
        Ok(Self::from_parts(client, use_http, apps_domain))
    }

    pub fn from_config(config: &Config) -> Result<Self, CfError> {
        Self::new(
            config.apps_domain()?,
            config.use_http,
            config.skip_ssl_validation,
        )
    }

    /// Client for absolute URLs only, with no apps domain behind it.
    pub fn for_urls(skip_ssl_validation: bool) -> Result<Self, CfError> {
        Self::new("", false, skip_ssl_validation)
    }

    /// Wraps an already configured client.
    pub fn from_parts(
        client: reqwest::Client,
        use_http: bool,
        apps_domain: impl Into<String>,
    ) -> Self {
        Self {
            client,
            scheme: if use_http { "http" } else { "https" },
            apps_domain: apps_domain.into(),
        }
    }

    /// `<scheme>://<host>.<apps_domain><path>`
    #[must_use]
    pub fn app_url(&self, host: &str, path: &str) -> String {
        format!("{}://{host}.{}{path}", self.scheme, self.apps_domain)
    }

    /// GETs `path` on the app and returns the body, whatever the status.
    pub async fn get(&self, host: &str, path: &str) -> Result<String, CfError> {
        self.get_url(&self.app_url(host, path)).await
    }

    /// GETs an absolute URL and returns the body, whatever the status.
    pub async fn get_url(&self, url: &str) -> Result<String, CfError> {
        let http_err = |source| CfError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(http_err)?;
        debug!(url, status = %response.status(), "responded");
        response.text().await.map_err(http_err)
    }

    /// Body at `url`, or an empty string while it cannot be reached. Suited
    /// as a poll probe.
    pub async fn fetch_url(&self, url: &str) -> String {
        match self.get_url(url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(url, error = %e, "not reachable yet");
                String::new()
            }
        }
    }

    /// Body of the app's root page, or empty while it cannot be reached.
    pub async fn curl_root(&self, host: &str) -> String {
        self.fetch_url(&self.app_url(host, "/")).await
    }

    /// Polls the app's root page until it contains `needle`.
    pub async fn await_body(
        &self,
        host: &str,
        needle: &str,
        policy: Eventually,
    ) -> Result<String, PollError> {
        policy
            .until(
                move || async move { Ok::<_, Infallible>(self.curl_root(host).await) },
                |body: &String| body.contains(needle),
            )
            .await
    }
}
