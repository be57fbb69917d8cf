//! Capability contracts shared by both adapter sets.
//!
//! Each adapter set (npm < 8, npm >= 8) supplies the same five capabilities
//! against a different npm CLI interface shape. The router hands out boxed
//! adapters; callers needing repeated access should hold on to them rather
//! than re-resolving (every router call re-probes the npm version).

use serde_json::Map;

use crate::cache::CacheResult;
use crate::load::NpmMeta;

/// npm runtime metadata probe (version, cache dir, registry, config map).
pub trait LoadAdapter {
    fn load(&self) -> Result<NpmMeta, String>;
}

/// Read access to npm's resolved configuration.
pub trait ConfigAdapter {
    /// Single key. `None` when npm reports the key as unset.
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    /// Full resolved config map.
    fn list(&self) -> Result<Map<String, serde_json::Value>, String>;
}

/// Download a package into npm's cache and describe where it landed.
pub trait CacheAdapter {
    fn add(&self, spec: &str) -> Result<CacheResult, String>;
}

/// Published versions of a package.
pub trait VersionsAdapter {
    /// All published versions, semver-ascending.
    fn versions(&self, package: &str) -> Result<Vec<String>, String>;
    /// The version the `latest` dist-tag points at.
    fn latest(&self, package: &str) -> Result<String, String>;
}

/// Facade bundling one adapter set's capabilities.
pub struct NpmUtils {
    pub cache: Box<dyn CacheAdapter>,
    pub config: Box<dyn ConfigAdapter>,
    pub load: Box<dyn LoadAdapter>,
    pub versions: Box<dyn VersionsAdapter>,
}
