//! Published-version lookups against the registry packument.

use semver::Version;
use serde_json::Value;

use crate::http_client;
use crate::manifest::auth_token_from_opts;

fn encoded_package_path(package: &str) -> String {
    if package.starts_with('@') {
        package.replace('/', "%2F")
    } else {
        package.to_string()
    }
}

/// A registry refusing the abbreviated packument media type. Anything else
/// (404, 5xx, transport) is a real failure and must not trigger a refetch.
pub fn is_content_negotiation_error(err: &str) -> bool {
    err == "HTTP 406" || err == "HTTP 415"
}

/// Fetch the packument for a package. Tries the abbreviated form first
/// (Accept: application/vnd.npm.install-v1+json); falls back to the full
/// document only when the registry rejects that media type.
pub fn fetch_packument(package: &str, registry: &str) -> Result<Value, String> {
    let url = format!(
        "{}/{}",
        registry.trim_end_matches('/'),
        encoded_package_path(package).trim_start_matches('/')
    );
    let token = auth_token_from_opts(&serde_json::Map::new(), &url);
    let body = match http_client::get_bytes_with_accept(
        &url,
        token.as_deref(),
        Some("application/vnd.npm.install-v1+json"),
    ) {
        Ok(b) => b,
        Err(e) if is_content_negotiation_error(&e) => {
            http_client::get_bytes_with_bearer(&url, token.as_deref())?
        }
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&body).map_err(|e| format!("invalid packument for {}: {}", package, e))
}

/// All version keys of a packument, semver-ascending. Unparsable keys are
/// dropped.
pub fn versions_from_packument(meta: &Value) -> Vec<String> {
    let mut parsed: Vec<Version> = meta
        .get("versions")
        .and_then(|v| v.as_object())
        .map(|o| o.keys().filter_map(|k| Version::parse(k).ok()).collect())
        .unwrap_or_default();
    parsed.sort();
    parsed.into_iter().map(|v| v.to_string()).collect()
}

/// The version the `latest` dist-tag points at.
pub fn latest_from_packument(meta: &Value) -> Option<String> {
    meta.get("dist-tags")?
        .as_object()?
        .get("latest")
        .and_then(|v| v.as_str())
        .map(String::from)
}
