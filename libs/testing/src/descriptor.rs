//! Fixture descriptors: everything needed to render a synthetic buildpack.

use pat_id::{marker_filename, AppName, BuildpackName, MarkerFile};

use crate::error::FixtureError;
use crate::scripts::BuildpackScripts;

/// Variables echoed by [`ReleaseVariant::EnvDump`] in the environment
/// propagation scenarios, in response order.
pub const STANDARD_ENV: &[&str] = &[
    "HOME",
    "MEMORY_LIMIT",
    "PORT",
    "PWD",
    "TMPDIR",
    "USER",
    "VCAP_APP_HOST",
    "VCAP_APPLICATION",
    "VCAP_APP_PORT",
    "VCAP_SERVICES",
];

/// Shape of the web process declared by the release script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReleaseVariant {
    /// Answer every request with the version-tagged greeting.
    #[default]
    Static,

    /// Greeting followed by one `NAME:value` line per variable, in order.
    EnvDump(Vec<String>),

    /// Greeting plus uptime; the process kills itself once it has been up
    /// for at least this many seconds.
    CrashAfter(u64),
}

impl ReleaseVariant {
    /// Env-dump variant over [`STANDARD_ENV`] plus any extra variables.
    pub fn standard_env_with<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vars: Vec<String> = STANDARD_ENV.iter().map(|v| v.to_string()).collect();
        vars.extend(extra.into_iter().map(Into::into));
        Self::EnvDump(vars)
    }
}

/// Everything needed to render one synthetic buildpack.
///
/// The same descriptor is handed to [`crate::AppDirectory::for_fixture`] and
/// to the archive builder, so app and buildpack always agree on the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureDescriptor {
    /// Registration key on the platform.
    pub name: BuildpackName,
    /// Echoed verbatim by compile and by the web process.
    pub version: String,
    /// File whose presence makes detect accept an app.
    pub marker: MarkerFile,
    /// Seconds the compile step sleeps before finishing.
    pub startup_delay_secs: u64,
    /// Web process declared by release.
    pub release: ReleaseVariant,
}

impl FixtureDescriptor {
    /// Descriptor for a buildpack that accepts exactly `app`.
    pub fn for_app(name: BuildpackName, app: &AppName, version: impl Into<String>) -> Self {
        Self {
            name,
            version: version.into(),
            marker: marker_filename(app),
            startup_delay_secs: 0,
            release: ReleaseVariant::Static,
        }
    }

    /// Sets the compile-step sleep.
    #[must_use]
    pub fn with_startup_delay(mut self, secs: u64) -> Self {
        self.startup_delay_secs = secs;
        self
    }

    /// Sets the release variant.
    #[must_use]
    pub fn with_release(mut self, release: ReleaseVariant) -> Self {
        self.release = release;
        self
    }

    /// Greeting the web process answers with (no trailing punctuation).
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("hi from a simple admin buildpack {}", self.version)
    }

    /// Line the compile step prints with the version.
    #[must_use]
    pub fn version_line(&self) -> String {
        format!("VERSION: {}", self.version)
    }

    /// Checks that the descriptor renders into working scripts.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let marker = self.marker.as_str();
        if marker.is_empty() || marker == "." || marker == ".." {
            return Err(FixtureError::invalid(format!(
                "marker {marker:?} is not a filename"
            )));
        }
        if marker.contains('/') || marker.contains('\0') {
            return Err(FixtureError::invalid(format!(
                "marker {marker:?} must be a single path component"
            )));
        }
        if let Some(bad) = self.version.chars().find(|&c| breaks_line(c)) {
            return Err(FixtureError::invalid(format!(
                "version must be one printable line, found {bad:?}"
            )));
        }
        if let ReleaseVariant::EnvDump(vars) = &self.release {
            if let Some(bad) = vars.iter().find(|v| !is_env_name(v)) {
                return Err(FixtureError::invalid(format!(
                    "{bad:?} is not a valid environment variable name"
                )));
            }
        }
        Ok(())
    }

    /// Validates and renders the three scripts.
    pub fn scripts(&self) -> Result<BuildpackScripts, FixtureError> {
        self.validate()?;
        Ok(BuildpackScripts::render(self))
    }
}

/// Characters that would split the version across lines of staging output
/// or of the release YAML.
fn breaks_line(c: char) -> bool {
    (c.is_control() && c != '\t') || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
