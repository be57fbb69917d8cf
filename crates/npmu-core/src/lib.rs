//! Core library for npmu: version router, adapter sets for npm < 8 and
//! npm >= 8, cache-result normalization, and the registry manifest client.
//! Used by the CLI binary; can be reused by other tools.

pub mod api;
pub mod cacache;
pub mod cache;
pub mod http_client;
pub mod load;
pub mod manifest;
pub mod npm;
pub mod npm8;
pub mod npmrc;
pub mod router;
pub mod utils;
pub mod version;
pub mod versions;

// Re-export main API for the CLI
pub use api::{CacheAdapter, ConfigAdapter, LoadAdapter, NpmUtils, VersionsAdapter};
pub use cache::{run_cache, run_cache_with, CacheResult, CacheStrategy, NpmCacheRunner};
pub use load::NpmMeta;
pub use manifest::{Manifest, ManifestFetcher, RegistryManifestFetcher};
pub use router::{
    get, get_cache, get_config, get_load, get_versions, resolve_generation, Generation,
};
pub use utils::{log, log_error};
pub use version::{parse_npm_version, CliNpm, NpmVersionProvider};
