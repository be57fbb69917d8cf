//! Minimal .npmrc reader: registry and auth tokens only.
//!
//! npm's resolved config (via the load adapter) is the source of truth; this
//! module covers the cases where a token lives in .npmrc under a host prefix
//! and npm's `config list` redacts it.

use std::collections::HashMap;
use std::path::Path;

/// Registry-related .npmrc settings.
#[derive(Default, Clone, Debug)]
pub struct NpmRc {
    pub registry: Option<String>,
    pub auth_token: Option<String>,
    pub auth_tokens_by_host_prefix: HashMap<String, String>,
}

fn read_npmrc(path: &Path) -> NpmRc {
    let mut out = NpmRc::default();
    let Ok(s) = std::fs::read_to_string(path) else {
        return out;
    };
    for raw in s.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        let mut value = v.trim().to_string();
        if value.starts_with("${") && value.ends_with('}') && value.len() > 3 {
            let env_key = &value[2..value.len() - 1];
            if let Ok(env_val) = std::env::var(env_key) {
                value = env_val;
            }
        }
        if key == "registry" {
            out.registry = Some(value.trim_end_matches('/').to_string());
            continue;
        }
        if key.ends_with(":_authToken") {
            out.auth_token = Some(value.clone());
            out.auth_tokens_by_host_prefix.insert(
                key.trim_end_matches(":_authToken")
                    .trim_start_matches("//")
                    .trim_end_matches('/')
                    .to_string(),
                value,
            );
            continue;
        }
    }
    out
}

fn dirs_home() -> Option<std::path::PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(std::path::PathBuf::from)
    }
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(std::path::PathBuf::from)
    }
}

/// Load .npmrc from dir then home, with dir taking precedence.
pub fn load_npmrc(dir: &Path) -> NpmRc {
    let project = read_npmrc(&dir.join(".npmrc"));
    let home_cfg = dirs_home()
        .map(|h| read_npmrc(&h.join(".npmrc")))
        .unwrap_or_default();
    let mut auth_tokens_by_host_prefix = home_cfg.auth_tokens_by_host_prefix;
    auth_tokens_by_host_prefix.extend(project.auth_tokens_by_host_prefix);
    NpmRc {
        registry: project.registry.or(home_cfg.registry),
        auth_token: project.auth_token.or(home_cfg.auth_token),
        auth_tokens_by_host_prefix,
    }
}

/// Effective registry URL without asking npm: NPM_CONFIG_REGISTRY env, then
/// .npmrc, then the public registry.
pub fn effective_registry(dir: &Path) -> String {
    if let Ok(v) = std::env::var("NPM_CONFIG_REGISTRY") {
        if !v.trim().is_empty() {
            return v.trim().trim_end_matches('/').to_string();
        }
    }
    load_npmrc(dir)
        .registry
        .unwrap_or_else(|| "https://registry.npmjs.org".to_string())
}

/// Best auth token for a registry URL: env first (NODE_AUTH_TOKEN, NPM_TOKEN),
/// then the longest matching .npmrc host-prefix token.
pub fn registry_auth_token_for_url(dir: &Path, url: &str) -> Option<String> {
    if let Ok(v) = std::env::var("NODE_AUTH_TOKEN") {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }
    if let Ok(v) = std::env::var("NPM_TOKEN") {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }

    let cfg = load_npmrc(dir);
    let normalized = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    let mut best: Option<(usize, String)> = None;
    for (prefix, token) in &cfg.auth_tokens_by_host_prefix {
        let p = prefix.trim().trim_end_matches('/');
        if p.is_empty() {
            continue;
        }
        if normalized.starts_with(p) {
            let score = p.len();
            match &best {
                Some((best_score, _)) if *best_score >= score => {}
                _ => best = Some((score, token.clone())),
            }
        }
    }
    best.map(|(_, t)| t).or(cfg.auth_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npmrc_registry_and_host_token() {
        let td = tempfile::tempdir().expect("tmp");
        std::fs::write(
            td.path().join(".npmrc"),
            "registry=https://npm.myco.local/\n//npm.myco.local/:_authToken=abc123\n",
        )
        .unwrap();

        let cfg = load_npmrc(td.path());
        assert_eq!(cfg.registry.as_deref(), Some("https://npm.myco.local"));
        assert_eq!(
            cfg.auth_tokens_by_host_prefix.get("npm.myco.local").map(String::as_str),
            Some("abc123")
        );

        let token = registry_auth_token_for_url(td.path(), "https://npm.myco.local/left-pad");
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_npmrc_comments_and_env_expansion() {
        let td = tempfile::tempdir().expect("tmp");
        std::env::set_var("NPMU_TEST_TOKEN", "from-env");
        std::fs::write(
            td.path().join(".npmrc"),
            "# comment\n; also comment\n//reg.example.com/:_authToken=${NPMU_TEST_TOKEN}\n",
        )
        .unwrap();
        let cfg = load_npmrc(td.path());
        assert_eq!(cfg.auth_token.as_deref(), Some("from-env"));
        std::env::remove_var("NPMU_TEST_TOKEN");
    }
}
