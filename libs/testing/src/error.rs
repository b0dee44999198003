//! Errors raised while building fixtures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from fixture generation and app-directory population.
///
/// Every variant is a setup failure: the calling scenario should abort.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The descriptor cannot produce working scripts.
    #[error("invalid fixture descriptor: {message}")]
    InvalidDescriptor { message: String },

    /// A filesystem operation failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip writer or reader failed.
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An archive is missing one of the required scripts.
    #[error("archive {} has no entry {entry}", .path.display())]
    MissingEntry { path: PathBuf, entry: String },

    /// A directory walk failed.
    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl FixtureError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }
}
