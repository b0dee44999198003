//! Script rendering for synthetic buildpacks.
//!
//! Rendering is pure: identical descriptors give byte-identical scripts.
//! Values coming from the descriptor are shell single-quoted, and YAML
//! single-quoted where they sit in release output, so versions and markers
//! reach the output exactly as written.

use crate::descriptor::{FixtureDescriptor, ReleaseVariant};

/// Archive path of the compile script.
pub const COMPILE_PATH: &str = "bin/compile";
/// Archive path of the detect script.
pub const DETECT_PATH: &str = "bin/detect";
/// Archive path of the release script.
pub const RELEASE_PATH: &str = "bin/release";

/// Banner the compile step prints first.
pub const STAGING_BANNER: &str = "Staging with Simple Buildpack";

/// The three rendered scripts of a buildpack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildpackScripts {
    pub compile: String,
    pub detect: String,
    pub release: String,
}

impl BuildpackScripts {
    /// Renders all scripts for `descriptor` without validating it.
    ///
    /// Prefer [`FixtureDescriptor::scripts`], which validates first.
    #[must_use]
    pub fn render(descriptor: &FixtureDescriptor) -> Self {
        Self {
            compile: render_compile(descriptor),
            detect: render_detect(descriptor),
            release: render_release(descriptor),
        }
    }

    /// Archive entries in their fixed packaging order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            (COMPILE_PATH, self.compile.as_str()),
            (DETECT_PATH, self.detect.as_str()),
            (RELEASE_PATH, self.release.as_str()),
        ]
    }
}

/// Quotes `value` for a POSIX shell.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Detect accepts the app iff the marker file sits directly in `$1`.
#[must_use]
pub fn render_detect(descriptor: &FixtureDescriptor) -> String {
    format!(
        r#"#!/usr/bin/env bash

if [ -f "${{1}}"/{marker} ]; then
  echo Simple
else
  echo no
  exit 1
fi
"#,
        marker = shell_quote(descriptor.marker.as_str()),
    )
}

/// Compile prints the banner and version, then sleeps the startup delay.
#[must_use]
pub fn render_compile(descriptor: &FixtureDescriptor) -> String {
    let delay = descriptor.startup_delay_secs;
    format!(
        r#"#!/usr/bin/env bash

sleep 1 # give log streaming time to attach

echo "{STAGING_BANNER}"
printf 'VERSION: %s\n' {version}
echo "Sleeping {delay}s..."
sleep {delay}
echo "Wake up...."
"#,
        version = shell_quote(&descriptor.version),
    )
}

/// Release declares the config vars and one long-running web process.
///
/// The heredoc is quoted, so release expands nothing; the web command
/// reaches the platform exactly as rendered here.
#[must_use]
pub fn render_release(descriptor: &FixtureDescriptor) -> String {
    let web = yaml_quote(&web_command(&descriptor.version, &descriptor.release));
    format!(
        r#"#!/usr/bin/env bash

cat <<'EOF'
---
config_vars:
  PATH: bin:/usr/local/bin:/usr/bin:/bin
  FROM_BUILD_PACK: "yes"
default_process_types:
  web: {web}
EOF
"#
    )
}

/// Quotes `value` as a YAML single-quoted scalar.
#[must_use]
pub fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// The web process as the platform's shell runs it.
fn web_command(version: &str, release: &ReleaseVariant) -> String {
    const RESPONSE_HEAD: &str = r"echo -e 'HTTP/1.1 200 OK\r\n';";
    const LISTEN: &str = "} | nc -l $PORT; done";

    let greeting = |suffix: &str| {
        format!(
            r"printf '%s\n' {};",
            shell_quote(&format!("hi from a simple admin buildpack {version}{suffix}"))
        )
    };

    match release {
        ReleaseVariant::Static => {
            format!("while true; do {{ {RESPONSE_HEAD} {} {LISTEN}", greeting(""))
        }
        ReleaseVariant::EnvDump(vars) => {
            let mut body = greeting(".");
            for var in vars {
                body.push_str(&format!(r#" echo "{var}:${var}";"#));
            }
            format!("while true; do {{ {RESPONSE_HEAD} {body} {LISTEN}")
        }
        ReleaseVariant::CrashAfter(secs) => format!(
            r#"started=$(date +%s); while true; do {{ {RESPONSE_HEAD} {} up=$(($(date +%s) - started)); echo "uptime:$up"; if [ $up -ge {secs} ]; then echo "killing myself"; kill $$; fi; {LISTEN}"#,
            greeting("")
        ),
    }
}
