//! npm runtime metadata: version, cache directory, registry, resolved config.

use std::path::PathBuf;

use semver::Version;
use serde_json::{Map, Value};

use crate::utils::{run_npm, NPM_PROBE_TIMEOUT_SECS};
use crate::version::parse_npm_version;

/// Snapshot of the installed npm's runtime metadata. Built once per call;
/// nothing here is cached across calls.
#[derive(Clone, Debug)]
pub struct NpmMeta {
    pub version: Version,
    pub cache_dir: PathBuf,
    pub registry: String,
    /// npm's resolved config, key for key. Passed through verbatim to
    /// manifest fetches so custom registries and auth survive.
    pub config: Map<String, Value>,
}

impl NpmMeta {
    /// Config map for downstream registry calls: every npm config key plus a
    /// guaranteed `registry` entry.
    pub fn config_opts(&self) -> Map<String, Value> {
        let mut opts = self.config.clone();
        opts.insert("registry".to_string(), Value::String(self.registry.clone()));
        opts
    }
}

/// Parse `npm config list --json` output into a config map.
pub fn parse_config_list(raw: &str) -> Result<Map<String, Value>, String> {
    let v: Value = serde_json::from_str(raw.trim())
        .map_err(|e| format!("unparsable npm config output: {}", e))?;
    match v {
        Value::Object(map) => Ok(map),
        _ => Err("npm config output is not an object".to_string()),
    }
}

fn config_str(config: &Map<String, Value>, key: &str) -> Option<String> {
    config.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Build metadata from already-probed parts. Errors when the config map has
/// no usable cache directory.
pub fn meta_from_parts(version: Version, config: Map<String, Value>) -> Result<NpmMeta, String> {
    let cache_dir = config_str(&config, "cache")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "npm config has no cache directory".to_string())?;
    let registry = config_str(&config, "registry")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://registry.npmjs.org".to_string());
    Ok(NpmMeta {
        version,
        cache_dir: PathBuf::from(cache_dir),
        registry: registry.trim_end_matches('/').to_string(),
        config,
    })
}

/// One-shot metadata load: `npm --version` + `npm config list --json`.
/// Used by the npm >= 8 adapter set.
pub fn load_via_config_list() -> Result<NpmMeta, String> {
    let version = parse_npm_version(&run_npm(&["--version"], NPM_PROBE_TIMEOUT_SECS)?)?;
    let config = parse_config_list(&run_npm(
        &["config", "list", "--json"],
        NPM_PROBE_TIMEOUT_SECS,
    )?)?;
    meta_from_parts(version, config)
}

/// Per-key metadata load: `npm --version` + `npm config get <key>` for the
/// keys the shim needs. Used by the npm < 8 adapter set, where `config list
/// --json` may be missing entirely on very old installs.
pub fn load_via_config_get() -> Result<NpmMeta, String> {
    let version = parse_npm_version(&run_npm(&["--version"], NPM_PROBE_TIMEOUT_SECS)?)?;
    let cache = run_npm(&["config", "get", "cache"], NPM_PROBE_TIMEOUT_SECS)?;
    let registry = run_npm(&["config", "get", "registry"], NPM_PROBE_TIMEOUT_SECS)?;
    let mut config = Map::new();
    config.insert("cache".to_string(), Value::String(cache));
    config.insert("registry".to_string(), Value::String(registry));
    meta_from_parts(version, config)
}
