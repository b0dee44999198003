//! # pat-id
//!
//! Resource names for acceptance scenarios that share one platform deployment.
//!
//! ## Design Principles
//!
//! - Every scenario run gets globally unique names; isolation comes from
//!   naming, never from locking
//! - Names are typed so an app name cannot be handed where a buildpack name
//!   is expected
//! - Random names are valid DNS labels, since app names double as hostnames
//! - Caller-supplied names are accepted verbatim (the platform is the one
//!   that validates them, and some scenarios push deliberately odd names)
//!
//! ## Name Format
//!
//! Random names use `{prefix}-{ulid}` with the ULID lowercased:
//!
//! - `app-01hv4z2wqxkjnm8gpqy6vbkc3d`
//! - `bp-01hv4z3mxnkpqr9hstz7wcld4e`
//!
//! The buildpack that should accept an app finds it through the app's
//! marker file, see [`marker_filename`].

mod error;
mod macros;
mod marker;
mod types;
mod version;

pub use error::NameError;
pub use marker::{marker_filename, MarkerFile, MARKER_PREFIX};
pub use types::*;
pub use version::random_version;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;

/// Generates an untyped collision-free name (`pat-{ulid}`).
///
/// Prefer the typed names; this exists for resources the suite only ever
/// passes through to the CLI (quotas, routes, ad-hoc labels).
#[must_use]
pub fn random_name() -> String {
    format!("pat-{}", Ulid::new().to_string().to_lowercase())
}
