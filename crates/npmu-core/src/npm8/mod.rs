//! Adapter set for npm >= 8.
//!
//! Modern npm is driven through its JSON surfaces: one `config list --json`
//! call for metadata, the registry HTTP API for version listings.

pub mod cache;
pub mod config;
pub mod load;
pub mod versions;

use crate::api::NpmUtils;

/// The full capability facade for this adapter set.
pub fn npm_utils() -> NpmUtils {
    NpmUtils {
        cache: Box::new(cache::ModernCache),
        config: Box::new(config::ModernConfig),
        load: Box::new(load::ModernLoad),
        versions: Box::new(versions::ModernVersions),
    }
}
