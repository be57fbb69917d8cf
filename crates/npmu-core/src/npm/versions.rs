use semver::Version;
use serde_json::Value;

use crate::api::VersionsAdapter;
use crate::utils::{run_npm, NPM_PROBE_TIMEOUT_SECS};

/// Versions capability for npm < 8: `npm view <pkg> versions --json`.
pub struct LegacyVersions;

/// `npm view versions --json` prints an array, or a bare string when the
/// package has a single published version.
pub fn parse_view_versions(raw: &str) -> Result<Vec<String>, String> {
    let v: Value = serde_json::from_str(raw.trim())
        .map_err(|e| format!("unparsable npm view output: {}", e))?;
    let mut parsed: Vec<Version> = match v {
        Value::String(s) => Version::parse(&s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str())
            .filter_map(|s| Version::parse(s).ok())
            .collect(),
        _ => return Err("npm view output is neither string nor array".to_string()),
    };
    parsed.sort();
    Ok(parsed.into_iter().map(|v| v.to_string()).collect())
}

impl VersionsAdapter for LegacyVersions {
    fn versions(&self, package: &str) -> Result<Vec<String>, String> {
        let raw = run_npm(&["view", package, "versions", "--json"], NPM_PROBE_TIMEOUT_SECS)?;
        parse_view_versions(&raw)
    }

    fn latest(&self, package: &str) -> Result<String, String> {
        let raw = run_npm(&["view", package, "version"], NPM_PROBE_TIMEOUT_SECS)?;
        let v = raw.trim().trim_matches('"').to_string();
        if v.is_empty() {
            return Err(format!("npm view returned no version for {}", package));
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_view_versions_array() {
        let out = r#"[ "1.0.2", "0.0.3", "1.3.0" ]"#;
        assert_eq!(parse_view_versions(out).unwrap(), vec!["0.0.3", "1.0.2", "1.3.0"]);
    }

    #[test]
    fn test_parse_view_versions_single_string() {
        assert_eq!(parse_view_versions(r#""1.0.0""#).unwrap(), vec!["1.0.0"]);
    }

    #[test]
    fn test_parse_view_versions_garbage() {
        assert!(parse_view_versions("{}").is_err());
        assert!(parse_view_versions("not json").is_err());
    }
}
