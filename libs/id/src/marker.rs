//! The marker-file convention that pairs an app with its buildpack.
//!
//! A synthetic buildpack accepts an application only when a file with the
//! app's marker name sits at the top of the app directory. The marker is
//! always derived from the app name, so the directory populator and the
//! buildpack generator agree without passing strings around.

use std::fmt;

use crate::AppName;

/// Prefix of every marker filename.
pub const MARKER_PREFIX: &str = "simple-buildpack-please-match-";

/// Filename whose presence makes a synthetic buildpack detect an app.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerFile(String);

impl MarkerFile {
    /// Returns the marker as a filename.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MarkerFile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for MarkerFile {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Maps an app name to its marker filename.
///
/// Pure, deterministic and injective. Path separators and `%` are
/// percent-encoded, so the marker is always a single path component and two
/// distinct app names never share a marker.
#[must_use]
pub fn marker_filename(app: &AppName) -> MarkerFile {
    let mut marker = String::from(MARKER_PREFIX);
    for c in app.as_str().chars() {
        match c {
            '%' => marker.push_str("%25"),
            '/' => marker.push_str("%2F"),
            '\\' => marker.push_str("%5C"),
            c => marker.push(c),
        }
    }
    MarkerFile(marker)
}
