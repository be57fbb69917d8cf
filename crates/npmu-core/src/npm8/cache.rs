use crate::api::CacheAdapter;
use crate::cache::{run_cache, CacheResult};
use crate::load::load_via_config_list;

/// Cache capability for npm >= 8. Always lands on the `_cacache` branch
/// (npm >= 8 implies the 5.0.0+ cache era), with the full resolved config
/// available for the manifest-fetch fallback.
pub struct ModernCache;

impl CacheAdapter for ModernCache {
    fn add(&self, spec: &str) -> Result<CacheResult, String> {
        let meta = load_via_config_list()?;
        run_cache(spec, &meta)
    }
}
