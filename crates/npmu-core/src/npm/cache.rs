use crate::api::CacheAdapter;
use crate::cache::{run_cache, CacheResult};
use crate::load::load_via_config_get;

/// Cache capability for npm < 8. The 5.0.0 cache-era branch is decided from
/// the probed metadata, so this adapter covers both the per-package layout
/// (npm 4 and older) and `_cacache` (npm 5 to 7).
pub struct LegacyCache;

impl CacheAdapter for LegacyCache {
    fn add(&self, spec: &str) -> Result<CacheResult, String> {
        let meta = load_via_config_get()?;
        run_cache(spec, &meta)
    }
}
