//! Throwaway application directories.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use pat_id::MarkerFile;
use tempfile::TempDir;
use tracing::debug;

use crate::descriptor::FixtureDescriptor;
use crate::error::FixtureError;
use crate::ignore::{self, IgnoreList};
use crate::manifest::Manifest;

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Largest app package the platform accepts, in bytes.
pub const PACKAGE_SIZE_LIMIT: u64 = 1_073_741_824;

/// Name of the filler file added by [`AppDirectory::for_fixture_with_payload`].
pub const FILLER_FILE: &str = "some-file";

/// An app source tree.
///
/// Scenario directories live in a private temporary directory that is
/// removed when dropped; call [`AppDirectory::close`] to observe removal
/// failures. Directories opened with [`AppDirectory::create_at`] or
/// [`AppDirectory::open`] are left in place.
#[derive(Debug)]
pub struct AppDirectory {
    root: Root,
}

#[derive(Debug)]
enum Root {
    Temp(TempDir),
    Kept(PathBuf),
}

impl AppDirectory {
    /// Creates an empty app directory.
    pub fn create() -> Result<Self, FixtureError> {
        let dir = tempfile::Builder::new()
            .prefix("matching-app")
            .tempdir()
            .map_err(|e| FixtureError::io("failed to create temp dir in", std::env::temp_dir(), e))?;
        debug!(path = %dir.path().display(), "created app directory");
        Ok(Self {
            root: Root::Temp(dir),
        })
    }

    /// Uses `path` as the app directory, creating it if needed.
    pub fn create_at(path: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|e| FixtureError::io("failed to create", &path, e))?;
        Ok(Self {
            root: Root::Kept(path),
        })
    }

    /// Uses an existing directory as the app directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let path = path.into();
        let meta = fs::metadata(&path).map_err(|e| FixtureError::io("failed to open", &path, e))?;
        if !meta.is_dir() {
            let source = std::io::Error::other("not a directory");
            return Err(FixtureError::io("failed to open", path, source));
        }
        Ok(Self {
            root: Root::Kept(path),
        })
    }

    /// Creates an app directory the fixture's buildpack will detect.
    pub fn for_fixture(descriptor: &FixtureDescriptor) -> Result<Self, FixtureError> {
        let app = Self::create()?;
        app.write_marker(&descriptor.marker)?;
        Ok(app)
    }

    /// Like [`AppDirectory::for_fixture`], plus a sparse filler file of
    /// `payload_bytes` so the package has a known size.
    pub fn for_fixture_with_payload(
        descriptor: &FixtureDescriptor,
        payload_bytes: u64,
    ) -> Result<Self, FixtureError> {
        let app = Self::for_fixture(descriptor)?;
        app.add_file(FILLER_FILE, payload_bytes)?;
        Ok(app)
    }

    /// Root of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        match &self.root {
            Root::Temp(dir) => dir.path(),
            Root::Kept(path) => path,
        }
    }

    /// Writes the (empty) marker file at the top level.
    pub fn write_marker(&self, marker: &MarkerFile) -> Result<PathBuf, FixtureError> {
        self.add_file(marker.as_str(), 0)
    }

    /// Creates a file of `size` bytes; parents are created as needed.
    ///
    /// The file is extended with `set_len`, so large payloads stay sparse on
    /// filesystems that support it.
    pub fn add_file(&self, relative: impl AsRef<Path>, size: u64) -> Result<PathBuf, FixtureError> {
        let path = self.resolve(relative.as_ref())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FixtureError::io("failed to create", parent, e))?;
        }
        let file = File::create(&path).map_err(|e| FixtureError::io("failed to create", &path, e))?;
        file.set_len(size)
            .map_err(|e| FixtureError::io("failed to size", &path, e))?;
        Ok(path)
    }

    /// Writes a file with the given contents.
    pub fn write_file(
        &self,
        relative: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf, FixtureError> {
        let path = self.resolve(relative.as_ref())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FixtureError::io("failed to create", parent, e))?;
        }
        fs::write(&path, contents).map_err(|e| FixtureError::io("failed to write", &path, e))?;
        Ok(path)
    }

    /// Creates a directory (and its parents).
    pub fn add_dir(&self, relative: impl AsRef<Path>) -> Result<PathBuf, FixtureError> {
        let path = self.resolve(relative.as_ref())?;
        fs::create_dir_all(&path).map_err(|e| FixtureError::io("failed to create", &path, e))?;
        Ok(path)
    }

    /// Writes `manifest.yml` at the top level.
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<PathBuf, FixtureError> {
        self.write_manifest_as("manifest.yml", manifest)
    }

    /// Writes a manifest under another file name (or in a subdirectory).
    pub fn write_manifest_as(
        &self,
        relative: impl AsRef<Path>,
        manifest: &Manifest,
    ) -> Result<PathBuf, FixtureError> {
        let rendered = manifest
            .render()
            .map_err(|e| FixtureError::invalid(format!("manifest does not serialize: {e}")))?;
        self.write_file(relative, rendered)
    }

    /// Writes `.cfignore` at the top level.
    pub fn write_ignore(&self, list: &IgnoreList) -> Result<PathBuf, FixtureError> {
        self.write_file(ignore::IGNORE_FILE, list.render())
    }

    /// Files the CLI would upload, given the `.cfignore` currently on disk.
    pub fn packaged_files(&self) -> Result<Vec<String>, FixtureError> {
        let ignore_path = self.path().join(ignore::IGNORE_FILE);
        let list = match fs::read(&ignore_path) {
            Ok(bytes) => IgnoreList::parse(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IgnoreList::default(),
            Err(e) => return Err(FixtureError::io("failed to read", ignore_path, e)),
        };
        ignore::packaged_files(self.path(), &list)
    }

    /// Removes a temporary directory, reporting failures. Kept directories
    /// are left alone.
    pub fn close(self) -> Result<(), FixtureError> {
        match self.root {
            Root::Temp(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()
                    .map_err(|e| FixtureError::io("failed to remove", path, e))
            }
            Root::Kept(_) => Ok(()),
        }
    }

    fn resolve(&self, relative: &Path) -> Result<PathBuf, FixtureError> {
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(FixtureError::invalid(format!(
                "{} escapes the app directory",
                relative.display()
            )));
        }
        Ok(self.path().join(relative))
    }
}
