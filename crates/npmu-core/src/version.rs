//! Probe for the installed npm CLI's version.
//!
//! The probe is behind a trait so the router can be exercised without
//! spawning processes; production uses [`CliNpm`], tests use stubs.

use semver::Version;

use crate::utils::{run_npm, NPM_PROBE_TIMEOUT_SECS};

/// Source of the installed npm's semantic version.
pub trait NpmVersionProvider {
    fn npm_version(&self) -> Result<Version, String>;
}

/// Production provider: runs `npm --version` on the host's PATH.
///
/// Assumption carried over from the original shim: the npm found on PATH is
/// the same npm whose cache and config later calls drive. Multiple npm
/// installations are not detected.
pub struct CliNpm;

impl NpmVersionProvider for CliNpm {
    fn npm_version(&self) -> Result<Version, String> {
        let raw = run_npm(&["--version"], NPM_PROBE_TIMEOUT_SECS)?;
        parse_npm_version(&raw)
    }
}

/// Parse `npm --version` output ("8.19.2\n", sometimes "v8.19.2").
pub fn parse_npm_version(raw: &str) -> Result<Version, String> {
    let cleaned = raw.trim().trim_start_matches('v');
    Version::parse(cleaned).map_err(|e| format!("unparsable npm version {:?}: {}", raw.trim(), e))
}
