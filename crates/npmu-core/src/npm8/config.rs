use serde_json::{Map, Value};

use crate::api::ConfigAdapter;
use crate::load::parse_config_list;
use crate::utils::{run_npm, NPM_PROBE_TIMEOUT_SECS};

/// Config access for npm >= 8: one `npm config list --json` call, looked up
/// locally per key.
pub struct ModernConfig;

/// Stringify a config value the way `npm config get` would print it.
pub fn config_value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl ConfigAdapter for ModernConfig {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let list = self.list()?;
        Ok(list.get(key).and_then(config_value_to_string))
    }

    fn list(&self) -> Result<Map<String, Value>, String> {
        let raw = run_npm(&["config", "list", "--json"], NPM_PROBE_TIMEOUT_SECS)?;
        parse_config_list(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_value_to_string() {
        assert_eq!(config_value_to_string(&json!("x")), Some("x".to_string()));
        assert_eq!(config_value_to_string(&json!(true)), Some("true".to_string()));
        assert_eq!(config_value_to_string(&json!(2)), Some("2".to_string()));
        assert_eq!(config_value_to_string(&Value::Null), None);
        assert_eq!(config_value_to_string(&json!("")), None);
    }
}
