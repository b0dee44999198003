//! # pat-cf
//!
//! Drives the platform CLI for acceptance scenarios.
//!
//! - [`Cf`] spawns the CLI with a private `CF_HOME`, an environment overlay
//!   and optional stdin, and enforces a deadline per command
//! - [`Session`] is the finished (or killed) command with its output and the
//!   ordered-output matchers scenarios assert with
//! - [`Platform`] wraps the administrative commands fixtures need
//!   (buildpack registration, deletion, `cf curl` lookups)
//! - [`AppClient`] fetches pages from pushed apps
//! - [`Scenario`] ties one app, one buildpack and their teardown together
//!
//! Configuration comes from the environment, see [`Config::from_env`].

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod platform;
pub mod push;
pub mod runner;
pub mod scenario;
pub mod session;

pub use config::Config;
pub use context::{CfHome, UserContext};
pub use error::CfError;
pub use http::AppClient;
pub use platform::{AppsResponse, BuildpacksResponse, Platform};
pub use push::PushArgs;
pub use runner::Cf;
pub use scenario::Scenario;
pub use session::{Exit, Session};
