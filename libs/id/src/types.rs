//! Typed name definitions for every resource a scenario creates.
//!
//! Each name type has a unique prefix so generated names reveal what they
//! label when they show up in platform listings.

use crate::define_name;

// =============================================================================
// Applications and Buildpacks
// =============================================================================

define_name!(AppName, "app");
define_name!(BuildpackName, "bp");
define_name!(HostName, "host");

// =============================================================================
// Organization and Services
// =============================================================================

define_name!(OrgName, "org");
define_name!(SpaceName, "space");
define_name!(ServiceName, "svc");
define_name!(QuotaName, "quota");

// =============================================================================
// Tests
// =============================================================================
