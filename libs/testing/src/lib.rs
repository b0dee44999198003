//! # pat-testing
//!
//! Reusable pieces of the platform acceptance suite.
//!
//! - [`FixtureDescriptor`] describes a synthetic buildpack; its scripts are
//!   rendered by pure functions ([`BuildpackScripts`]) and packaged by
//!   [`build_fixture_archive`] / [`BuildpackArchive`]
//! - [`AppDirectory`] is a throwaway app source tree carrying the marker file
//!   the paired buildpack detects
//! - [`manifest`] and [`ignore`] produce the documents the CLI reads next to
//!   an app (`manifest.yml`, `.cfignore`)
//! - [`poll`] hides propagation delay behind a deadline-bounded retry loop
//! - [`teardown`] runs cleanup whether or not a scenario body panicked

pub mod app;
pub mod archive;
pub mod descriptor;
mod error;
pub mod ignore;
pub mod manifest;
pub mod poll;
pub mod scripts;
pub mod teardown;

pub use app::{AppDirectory, MIB, PACKAGE_SIZE_LIMIT};
pub use archive::{build_fixture_archive, read_archive, ArchiveEntry, BuildpackArchive};
pub use descriptor::{FixtureDescriptor, ReleaseVariant, STANDARD_ENV};
pub use error::FixtureError;
pub use ignore::{packaged_files, IgnoreList, IgnoreMatcher, DEFAULT_IGNORED};
pub use manifest::{AppManifest, Manifest, ManifestError};
pub use poll::{await_contains, await_match, Eventually, PollError, TimeoutTier};
pub use scripts::BuildpackScripts;
pub use teardown::{with_teardown, TeardownError, TeardownLog};
