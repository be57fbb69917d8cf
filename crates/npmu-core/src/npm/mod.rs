//! Adapter set for npm < 8.
//!
//! Old npm installs are probed key by key (`npm config get`, `npm view`)
//! since JSON output flags are not reliable across the whole < 8 range.

pub mod cache;
pub mod config;
pub mod load;
pub mod versions;

use crate::api::NpmUtils;

/// The full capability facade for this adapter set.
pub fn npm_utils() -> NpmUtils {
    NpmUtils {
        cache: Box::new(cache::LegacyCache),
        config: Box::new(config::LegacyConfig),
        load: Box::new(load::LegacyLoad),
        versions: Box::new(versions::LegacyVersions),
    }
}
