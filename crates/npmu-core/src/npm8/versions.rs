use std::path::Path;

use crate::api::VersionsAdapter;
use crate::load::{load_via_config_list, NpmMeta};
use crate::npmrc;
use crate::versions::{fetch_packument, latest_from_packument, versions_from_packument};

/// Versions capability for npm >= 8: registry packument over HTTP.
pub struct ModernVersions;

/// Registry for packument lookups: npm's own resolved config is the source
/// of truth; env/.npmrc only when the probe fails.
pub fn lookup_registry(meta: Result<NpmMeta, String>) -> String {
    match meta {
        Ok(meta) => meta.registry,
        Err(_) => npmrc::effective_registry(Path::new(".")),
    }
}

impl ModernVersions {
    fn registry(&self) -> String {
        lookup_registry(load_via_config_list())
    }
}

impl VersionsAdapter for ModernVersions {
    fn versions(&self, package: &str) -> Result<Vec<String>, String> {
        let meta = fetch_packument(package, &self.registry())?;
        Ok(versions_from_packument(&meta))
    }

    fn latest(&self, package: &str) -> Result<String, String> {
        let meta = fetch_packument(package, &self.registry())?;
        latest_from_packument(&meta)
            .ok_or_else(|| format!("no latest dist-tag for {}", package))
    }
}
