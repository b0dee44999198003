//! Random buildpack versions.

/// Returns a two-decimal version string in `[0.00, 5.00)`, e.g. `3.42`.
///
/// Scenarios push two buildpacks with different versions and tell them apart
/// by the version echoed at staging time.
#[must_use]
pub fn random_version() -> String {
    hundredths(rand::random_range(0..500))
}

fn hundredths(n: u32) -> String {
    format!("{}.{:02}", n / 100, n % 100)
}
