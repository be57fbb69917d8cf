//! Version router: probe the installed npm, pick the matching adapter set.
//!
//! npm's internals changed shape in 8.0.0, so two parallel adapter sets
//! exist ([`crate::npm`] for < 8, [`crate::npm8`] for >= 8). Every accessor
//! re-probes the npm version; the decision is deliberately not cached, so a
//! changed PATH is picked up on the next call. Callers needing repeated
//! access should keep the returned adapter.
//!
//! Assumption (inherited, documented rather than resolved): the npm on PATH
//! is the npm whose cache and config the adapters then drive.

use semver::Version;

use crate::api::{CacheAdapter, ConfigAdapter, LoadAdapter, NpmUtils, VersionsAdapter};
use crate::version::{CliNpm, NpmVersionProvider};
use crate::{npm, npm8};

/// Which adapter set serves the installed npm.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Generation {
    /// npm < 8.0.0
    Legacy,
    /// npm >= 8.0.0
    Modern,
}

impl Generation {
    /// Name of the adapter set, for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Generation::Legacy => "npm",
            Generation::Modern => "npm8",
        }
    }
}

/// Resolve the adapter generation from a version provider. Probe failures
/// propagate unchanged; there is no retry and no default generation.
pub fn resolve_generation(provider: &dyn NpmVersionProvider) -> Result<Generation, String> {
    let version = provider.npm_version()?;
    if version < Version::new(8, 0, 0) {
        Ok(Generation::Legacy)
    } else {
        Ok(Generation::Modern)
    }
}

/// The full capability facade for the installed npm.
pub fn get() -> Result<NpmUtils, String> {
    match resolve_generation(&CliNpm)? {
        Generation::Legacy => Ok(npm::npm_utils()),
        Generation::Modern => Ok(npm8::npm_utils()),
    }
}

/// Cache capability for the installed npm.
pub fn get_cache() -> Result<Box<dyn CacheAdapter>, String> {
    match resolve_generation(&CliNpm)? {
        Generation::Legacy => Ok(Box::new(npm::cache::LegacyCache)),
        Generation::Modern => Ok(Box::new(npm8::cache::ModernCache)),
    }
}

/// Config capability for the installed npm.
pub fn get_config() -> Result<Box<dyn ConfigAdapter>, String> {
    match resolve_generation(&CliNpm)? {
        Generation::Legacy => Ok(Box::new(npm::config::LegacyConfig)),
        Generation::Modern => Ok(Box::new(npm8::config::ModernConfig)),
    }
}

/// Load capability for the installed npm.
pub fn get_load() -> Result<Box<dyn LoadAdapter>, String> {
    match resolve_generation(&CliNpm)? {
        Generation::Legacy => Ok(Box::new(npm::load::LegacyLoad)),
        Generation::Modern => Ok(Box::new(npm8::load::ModernLoad)),
    }
}

/// Versions capability for the installed npm.
pub fn get_versions() -> Result<Box<dyn VersionsAdapter>, String> {
    match resolve_generation(&CliNpm)? {
        Generation::Legacy => Ok(Box::new(npm::versions::LegacyVersions)),
        Generation::Modern => Ok(Box::new(npm8::versions::ModernVersions)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider {
        result: Result<Version, String>,
    }

    impl NpmVersionProvider for StubProvider {
        fn npm_version(&self) -> Result<Version, String> {
            self.result.clone()
        }
    }

    fn provider(v: &str) -> StubProvider {
        StubProvider { result: Ok(Version::parse(v).unwrap()) }
    }

    #[test]
    fn test_below_8_routes_legacy() {
        assert_eq!(resolve_generation(&provider("7.9.9")).unwrap(), Generation::Legacy);
        assert_eq!(resolve_generation(&provider("4.6.1")).unwrap(), Generation::Legacy);
    }

    #[test]
    fn test_boundary_exact_at_8() {
        assert_eq!(resolve_generation(&provider("8.0.0")).unwrap(), Generation::Modern);
        assert_eq!(resolve_generation(&provider("10.2.4")).unwrap(), Generation::Modern);
    }

    #[test]
    fn test_probe_failure_propagates_unchanged() {
        let p = StubProvider { result: Err("npm: command not found".to_string()) };
        assert_eq!(resolve_generation(&p).unwrap_err(), "npm: command not found");
    }

    #[test]
    fn test_generation_names() {
        assert_eq!(Generation::Legacy.as_str(), "npm");
        assert_eq!(Generation::Modern.as_str(), "npm8");
    }
}
