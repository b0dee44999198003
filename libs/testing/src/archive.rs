//! Buildpack archive packaging.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::descriptor::FixtureDescriptor;
use crate::error::FixtureError;
use crate::scripts::{COMPILE_PATH, DETECT_PATH, RELEASE_PATH};

/// Unix mode of every script in the archive.
pub const SCRIPT_MODE: u32 = 0o755;

/// Writes the descriptor's scripts into a zip at `dest`.
///
/// Entries are written in a fixed order with a fixed timestamp, so identical
/// descriptors produce byte-identical archives.
pub fn build_fixture_archive(
    descriptor: &FixtureDescriptor,
    dest: &Path,
) -> Result<PathBuf, FixtureError> {
    let scripts = descriptor.scripts()?;

    let file = File::create(dest).map_err(|e| FixtureError::io("failed to create", dest, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(SCRIPT_MODE);

    for (path, body) in scripts.entries() {
        zip.start_file(path, options)?;
        zip.write_all(body.as_bytes())
            .map_err(|e| FixtureError::io("failed to write", dest, e))?;
    }
    zip.finish()?;

    debug!(
        buildpack = %descriptor.name,
        version = %descriptor.version,
        path = %dest.display(),
        "wrote buildpack archive"
    );
    Ok(dest.to_path_buf())
}

/// A buildpack archive staged in its own temporary directory.
///
/// The directory is deleted when this value is dropped, normally right after
/// the archive has been uploaded.
#[derive(Debug)]
pub struct BuildpackArchive {
    path: PathBuf,
    dir: TempDir,
}

impl BuildpackArchive {
    /// Builds `buildpack_<version>.zip` in a fresh temporary directory.
    pub fn build(descriptor: &FixtureDescriptor) -> Result<Self, FixtureError> {
        let dir = tempfile::Builder::new()
            .prefix("matching-buildpack")
            .tempdir()
            .map_err(|e| FixtureError::io("failed to create temp dir in", std::env::temp_dir(), e))?;
        let path = dir.path().join(archive_file_name(&descriptor.version));
        build_fixture_archive(descriptor, &path)?;
        Ok(Self { path, dir })
    }

    /// Path of the zip file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the staging directory, reporting failures.
    pub fn close(self) -> Result<(), FixtureError> {
        let dir_path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| FixtureError::io("failed to remove", dir_path, e))
    }
}

/// File name used for staged archives; the version keeps successive uploads
/// distinguishable in platform listings.
#[must_use]
pub fn archive_file_name(version: &str) -> String {
    let safe: String = version
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("buildpack_{safe}.zip")
}

/// One file read back from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub mode: Option<u32>,
    pub size: u64,
    pub sha256: String,
    pub body: String,
}

impl ArchiveEntry {
    /// True if owner, group and other may all execute the entry.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.mode.is_some_and(|m| m & 0o111 == 0o111)
    }
}

/// Reads every entry of a zip archive, in archive order.
pub fn read_archive(path: &Path) -> Result<Vec<ArchiveEntry>, FixtureError> {
    let file = File::open(path).map_err(|e| FixtureError::io("failed to open", path, e))?;
    let mut archive = ZipArchive::new(file)?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let mut body = String::new();
        entry
            .read_to_string(&mut body)
            .map_err(|e| FixtureError::io("failed to read entry of", path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());

        entries.push(ArchiveEntry {
            path: entry.name().to_string(),
            mode: entry.unix_mode().map(|m| m & 0o7777),
            size: entry.size(),
            sha256: format!("{:x}", hasher.finalize()),
            body,
        });
    }
    Ok(entries)
}

/// Reads an archive and checks it carries exactly the three scripts.
pub fn verify_archive(path: &Path) -> Result<Vec<ArchiveEntry>, FixtureError> {
    let entries = read_archive(path)?;
    for required in [COMPILE_PATH, DETECT_PATH, RELEASE_PATH] {
        if !entries.iter().any(|e| e.path == required) {
            return Err(FixtureError::MissingEntry {
                path: path.to_path_buf(),
                entry: required.to_string(),
            });
        }
    }
    Ok(entries)
}
