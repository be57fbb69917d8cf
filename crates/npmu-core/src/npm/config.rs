use serde_json::{Map, Value};

use crate::api::ConfigAdapter;
use crate::utils::{run_npm, NPM_PROBE_TIMEOUT_SECS};

/// Config access for npm < 8: per-key `npm config get`.
pub struct LegacyConfig;

/// `npm config get` prints the literal string "undefined" for unset keys.
pub fn normalize_config_get(raw: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() || v == "undefined" || v == "null" {
        None
    } else {
        Some(v.to_string())
    }
}

impl ConfigAdapter for LegacyConfig {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let raw = run_npm(&["config", "get", key], NPM_PROBE_TIMEOUT_SECS)?;
        Ok(normalize_config_get(&raw))
    }

    fn list(&self) -> Result<Map<String, Value>, String> {
        // npm 5 through 7 all support the JSON listing; on anything older
        // the command's own error propagates.
        let raw = run_npm(&["config", "list", "--json"], NPM_PROBE_TIMEOUT_SECS)?;
        crate::load::parse_config_list(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_config_get() {
        assert_eq!(normalize_config_get("https://registry.npmjs.org/\n"), Some("https://registry.npmjs.org/".to_string()));
        assert_eq!(normalize_config_get("undefined\n"), None);
        assert_eq!(normalize_config_get("null"), None);
        assert_eq!(normalize_config_get(""), None);
    }
}
