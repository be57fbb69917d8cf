//! Registry manifest fetch: the fallback used when `npm cache add` yields no
//! package data. Mirrors what pacote.manifest gives npm itself: name,
//! version, and the dist integrity hash.

use std::path::Path;

use serde_json::{Map, Value};

use crate::http_client;
use crate::npmrc;
use crate::utils::split_spec;

/// Registry metadata for one package version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub integrity: Option<String>,
}

/// Manifest lookup seam. `opts` is npm's resolved config passed through
/// verbatim (always includes `registry`).
pub trait ManifestFetcher {
    fn manifest(&self, spec: &str, opts: &Map<String, Value>) -> Result<Manifest, String>;
}

fn encoded_package_path(package: &str) -> String {
    if package.starts_with('@') {
        package.replace('/', "%2F")
    } else {
        package.to_string()
    }
}

/// Registry base URL out of the config opts; registry.npmjs.org when absent.
pub fn registry_from_opts(opts: &Map<String, Value>) -> String {
    opts.get("registry")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| "https://registry.npmjs.org".to_string())
}

/// Auth token for a registry URL: `//host/:_authToken` entries in the config
/// opts first, then env/.npmrc.
pub fn auth_token_from_opts(opts: &Map<String, Value>, url: &str) -> Option<String> {
    let normalized = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let mut best: Option<(usize, String)> = None;
    for (key, value) in opts {
        let Some(prefix) = key.strip_suffix(":_authToken") else {
            continue;
        };
        let p = prefix.trim_start_matches("//").trim_end_matches('/');
        if p.is_empty() || !normalized.starts_with(p) {
            continue;
        }
        if let Some(token) = value.as_str().filter(|t| !t.is_empty()) {
            match &best {
                Some((best_score, _)) if *best_score >= p.len() => {}
                _ => best = Some((p.len(), token.to_string())),
            }
        }
    }
    best.map(|(_, t)| t)
        .or_else(|| npmrc::registry_auth_token_for_url(Path::new("."), url))
}

/// Production fetcher: GET `<registry>/<name>/<selector>` through the shared
/// HTTP client.
pub struct RegistryManifestFetcher;

impl ManifestFetcher for RegistryManifestFetcher {
    fn manifest(&self, spec: &str, opts: &Map<String, Value>) -> Result<Manifest, String> {
        let (name, selector) = split_spec(spec);
        let selector = selector.filter(|s| !s.is_empty()).unwrap_or("latest");
        let base = registry_from_opts(opts);
        let url = format!(
            "{}/{}/{}",
            base.trim_end_matches('/'),
            encoded_package_path(name).trim_start_matches('/'),
            selector
        );
        let token = auth_token_from_opts(opts, &url);
        let body = http_client::get_bytes_with_bearer(&url, token.as_deref())?;
        let v: Value = serde_json::from_slice(&body)
            .map_err(|e| format!("invalid manifest JSON for {}: {}", spec, e))?;
        parse_manifest(&v, spec)
    }
}

/// Pull name/version/integrity out of a manifest document.
pub fn parse_manifest(v: &Value, spec: &str) -> Result<Manifest, String> {
    let name = v
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| format!("no name in manifest for {}", spec))?
        .to_string();
    let version = v
        .get("version")
        .and_then(|n| n.as_str())
        .ok_or_else(|| format!("no version in manifest for {}", spec))?
        .to_string();
    let integrity = v
        .get("dist")
        .and_then(|d| d.as_object())
        .and_then(|d| d.get("integrity"))
        .and_then(|i| i.as_str())
        .map(String::from);
    Ok(Manifest { name, version, integrity })
}
