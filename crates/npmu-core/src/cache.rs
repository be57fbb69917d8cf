//! Cache normalization: run `npm cache add` and describe where the package's
//! data lives, in a shape that is stable across npm eras.
//!
//! npm changed its cache layout in 5.0.0: before, tarballs sat at
//! `<cache>/<name>/<version>/package.tgz`; since, content lives in
//! `_cacache` addressed by integrity hash. The strategy is picked once per
//! call from the probed npm metadata and each branch fills exactly one of
//! `path` / `integrity`.

use std::path::PathBuf;

use semver::Version;
use serde::Serialize;
use serde_json::Value;

use crate::load::NpmMeta;
use crate::manifest::{Manifest, ManifestFetcher, RegistryManifestFetcher};
use crate::utils::{run_npm, split_spec, NPM_CACHE_TIMEOUT_SECS};

/// Where a cached package's data can be found. Exactly one of `path` /
/// `integrity` is populated, determined by which cache era produced it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CacheResult {
    pub cache: PathBuf,
    pub name: String,
    pub version: String,
    pub path: Option<PathBuf>,
    pub integrity: Option<String>,
}

/// Package data reported by the cache-add command, when it reports any.
/// npm >= 5.6 prints nothing on success; older eras returned a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheAddInfo {
    pub name: String,
    pub version: String,
    pub integrity: Option<String>,
}

/// Seam over the cache-add command so the branches are testable without an
/// npm installation.
pub trait NpmCacheRunner {
    /// Download `spec` into npm's cache. `Ok(None)` means the command
    /// succeeded without reporting package data.
    fn cache_add(&self, spec: &str) -> Result<Option<CacheAddInfo>, String>;
}

/// Which cache era the probed npm belongs to. Dispatched once per call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheStrategy {
    /// npm < 5.0.0: per-package directories, no integrity metadata.
    Legacy,
    /// npm >= 5.0.0: content-addressable `_cacache`, integrity-keyed.
    Modern,
}

impl CacheStrategy {
    pub fn select(npm_version: &Version) -> CacheStrategy {
        if *npm_version < Version::new(5, 0, 0) {
            CacheStrategy::Legacy
        } else {
            CacheStrategy::Modern
        }
    }
}

/// Production runner: shells out to `npm cache add <spec>`.
pub struct CliCacheRunner;

impl NpmCacheRunner for CliCacheRunner {
    fn cache_add(&self, spec: &str) -> Result<Option<CacheAddInfo>, String> {
        let stdout = run_npm(&["cache", "add", spec], NPM_CACHE_TIMEOUT_SECS)?;
        Ok(parse_cache_add_output(&stdout, spec))
    }
}

/// Interpret cache-add stdout. Older npm printed the package manifest as
/// JSON; newer npm prints nothing. When output is unusable but the spec pins
/// an exact version, that pin is the reported data.
pub fn parse_cache_add_output(stdout: &str, spec: &str) -> Option<CacheAddInfo> {
    if let Ok(v) = serde_json::from_str::<Value>(stdout.trim()) {
        let name = v.get("name").and_then(|n| n.as_str());
        let version = v.get("version").and_then(|n| n.as_str());
        if let (Some(name), Some(version)) = (name, version) {
            let integrity = v
                .get("_integrity")
                .and_then(|i| i.as_str())
                .or_else(|| {
                    v.get("dist")
                        .and_then(|d| d.as_object())
                        .and_then(|d| d.get("integrity"))
                        .and_then(|i| i.as_str())
                })
                .map(String::from);
            return Some(CacheAddInfo {
                name: name.to_string(),
                version: version.to_string(),
                integrity,
            });
        }
    }
    let (name, version) = split_spec(spec);
    let version = version?;
    if Version::parse(version).is_err() {
        return None;
    }
    Some(CacheAddInfo {
        name: name.to_string(),
        version: version.to_string(),
        integrity: None,
    })
}

/// Download `spec` into npm's cache and normalize the outcome. Underlying
/// command and fetch errors pass through unchanged; no retry, no partial
/// result.
pub fn run_cache_with(
    spec: &str,
    meta: &NpmMeta,
    runner: &dyn NpmCacheRunner,
    fetcher: &dyn ManifestFetcher,
) -> Result<CacheResult, String> {
    match CacheStrategy::select(&meta.version) {
        CacheStrategy::Legacy => legacy_cache(spec, meta, runner, fetcher),
        CacheStrategy::Modern => modern_cache(spec, meta, runner, fetcher),
    }
}

/// Convenience wrapper with the production runner and fetcher.
pub fn run_cache(spec: &str, meta: &NpmMeta) -> Result<CacheResult, String> {
    run_cache_with(spec, meta, &CliCacheRunner, &RegistryManifestFetcher)
}

/// Pre-5.0.0 branch: tarball sits at a deterministic per-package path under
/// the cache root. `integrity` is always None here.
fn legacy_cache(
    spec: &str,
    meta: &NpmMeta,
    runner: &dyn NpmCacheRunner,
    fetcher: &dyn ManifestFetcher,
) -> Result<CacheResult, String> {
    let info = runner.cache_add(spec)?;
    let (name, version) = match info {
        Some(i) => (i.name, i.version),
        None => {
            // Command reported nothing and the spec doesn't pin a version;
            // resolve name/version from the registry. Integrity stays None.
            let m = fetcher.manifest(spec, &meta.config_opts())?;
            (m.name, m.version)
        }
    };
    let path = meta.cache_dir.join(&name).join(&version).join("package.tgz");
    Ok(CacheResult {
        cache: meta.cache_dir.clone(),
        name,
        version,
        path: Some(path),
        integrity: None,
    })
}

/// 5.0.0+ branch: content lives in `_cacache`, keyed by integrity. When the
/// command omits the manifest (npm >= 5.6 does), fetch it from the registry
/// with npm's resolved config passed through verbatim. `path` is always None
/// here.
fn modern_cache(
    spec: &str,
    meta: &NpmMeta,
    runner: &dyn NpmCacheRunner,
    fetcher: &dyn ManifestFetcher,
) -> Result<CacheResult, String> {
    let info = runner.cache_add(spec)?;
    let manifest = match info {
        Some(i) if i.integrity.is_some() => Manifest {
            name: i.name,
            version: i.version,
            integrity: i.integrity,
        },
        _ => fetcher.manifest(spec, &meta.config_opts())?,
    };
    Ok(CacheResult {
        cache: meta.cache_dir.join("_cacache"),
        name: manifest.name,
        version: manifest.version,
        path: None,
        integrity: manifest.integrity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::meta_from_parts;
    use serde_json::{json, Map};
    use std::sync::Mutex;

    const LEFT_PAD_SRI: &str =
        "sha512-XI5MPzVNApjAyhQzphX8BkmKsKUxD4LdyK24iZeQGinBN9yTQT3bFlCBy/aVx2HrNcqQGsdot8yNiWlgT3GrGA==";

    fn meta(npm_version: &str) -> NpmMeta {
        let mut config = Map::new();
        config.insert("cache".into(), json!("/home/u/.npm"));
        config.insert("registry".into(), json!("https://registry.npmjs.org/"));
        config.insert("fetch-retries".into(), json!(2));
        config.insert("strict-ssl".into(), json!(true));
        meta_from_parts(Version::parse(npm_version).unwrap(), config).unwrap()
    }

    struct StubRunner {
        result: Result<Option<CacheAddInfo>, String>,
    }

    impl NpmCacheRunner for StubRunner {
        fn cache_add(&self, _spec: &str) -> Result<Option<CacheAddInfo>, String> {
            self.result.clone()
        }
    }

    struct StubFetcher {
        manifest: Result<Manifest, String>,
        seen_opts: Mutex<Option<Map<String, Value>>>,
    }

    impl StubFetcher {
        fn returning(manifest: Manifest) -> Self {
            Self { manifest: Ok(manifest), seen_opts: Mutex::new(None) }
        }

        fn failing(err: &str) -> Self {
            Self { manifest: Err(err.to_string()), seen_opts: Mutex::new(None) }
        }
    }

    impl ManifestFetcher for StubFetcher {
        fn manifest(&self, _spec: &str, opts: &Map<String, Value>) -> Result<Manifest, String> {
            *self.seen_opts.lock().unwrap() = Some(opts.clone());
            self.manifest.clone()
        }
    }

    fn left_pad_manifest() -> Manifest {
        Manifest {
            name: "left-pad".into(),
            version: "1.3.0".into(),
            integrity: Some(LEFT_PAD_SRI.into()),
        }
    }

    #[test]
    fn test_strategy_boundary_exact_at_5() {
        assert_eq!(CacheStrategy::select(&Version::new(4, 6, 1)), CacheStrategy::Legacy);
        assert_eq!(CacheStrategy::select(&Version::new(5, 0, 0)), CacheStrategy::Modern);
        assert_eq!(CacheStrategy::select(&Version::new(8, 19, 2)), CacheStrategy::Modern);
    }

    #[test]
    fn test_legacy_branch_synthesizes_tarball_path() {
        let runner = StubRunner {
            result: Ok(Some(CacheAddInfo {
                name: "lodash".into(),
                version: "4.17.21".into(),
                integrity: None,
            })),
        };
        let fetcher = StubFetcher::failing("fetcher must not be called");
        let meta = meta("4.6.1");
        let res = run_cache_with("lodash@4.17.21", &meta, &runner, &fetcher).unwrap();
        assert_eq!(res.cache, PathBuf::from("/home/u/.npm"));
        assert_eq!(res.name, "lodash");
        assert_eq!(res.version, "4.17.21");
        assert_eq!(
            res.path.as_deref(),
            Some(std::path::Path::new("/home/u/.npm/lodash/4.17.21/package.tgz"))
        );
        assert_eq!(res.integrity, None);
        assert!(fetcher.seen_opts.lock().unwrap().is_none());
    }

    #[test]
    fn test_modern_branch_uses_command_integrity() {
        let runner = StubRunner {
            result: Ok(Some(CacheAddInfo {
                name: "left-pad".into(),
                version: "1.3.0".into(),
                integrity: Some(LEFT_PAD_SRI.into()),
            })),
        };
        let fetcher = StubFetcher::failing("fetcher must not be called");
        let res = run_cache_with("left-pad@1.3.0", &meta("5.0.0"), &runner, &fetcher).unwrap();
        assert_eq!(res.cache, PathBuf::from("/home/u/.npm/_cacache"));
        assert_eq!(res.path, None);
        assert_eq!(res.integrity.as_deref(), Some(LEFT_PAD_SRI));
        assert!(fetcher.seen_opts.lock().unwrap().is_none());
    }

    #[test]
    fn test_modern_fallback_passes_full_config_through() {
        let runner = StubRunner { result: Ok(None) };
        let fetcher = StubFetcher::returning(left_pad_manifest());
        let meta = meta("8.19.2");
        let res = run_cache_with("left-pad@1.3.0", &meta, &runner, &fetcher).unwrap();
        assert_eq!(res.integrity.as_deref(), Some(LEFT_PAD_SRI));

        let seen = fetcher.seen_opts.lock().unwrap().clone().expect("fetcher called");
        assert_eq!(
            seen.get("registry").and_then(|v| v.as_str()),
            Some("https://registry.npmjs.org")
        );
        for key in meta.config.keys() {
            assert!(seen.contains_key(key), "config key {} not passed through", key);
        }
    }

    #[test]
    fn test_command_error_forwarded_unchanged() {
        let runner = StubRunner {
            result: Err("npm ERR! code EAI_AGAIN".to_string()),
        };
        let fetcher = StubFetcher::failing("unused");
        let err = run_cache_with("left-pad@1.3.0", &meta("8.0.0"), &runner, &fetcher).unwrap_err();
        assert_eq!(err, "npm ERR! code EAI_AGAIN");
    }

    #[test]
    fn test_fallback_fetch_error_forwarded_unchanged() {
        let runner = StubRunner { result: Ok(None) };
        let fetcher = StubFetcher::failing("HTTP 503");
        let err = run_cache_with("left-pad@1.3.0", &meta("6.0.0"), &runner, &fetcher).unwrap_err();
        assert_eq!(err, "HTTP 503");
    }

    #[test]
    fn test_end_to_end_left_pad_on_npm_6() {
        let runner = StubRunner { result: Ok(None) };
        let fetcher = StubFetcher::returning(left_pad_manifest());
        let res = run_cache_with("left-pad@1.3.0", &meta("6.0.0"), &runner, &fetcher).unwrap();
        assert_eq!(res.name, "left-pad");
        assert_eq!(res.version, "1.3.0");
        assert_eq!(res.path, None);
        assert!(res.integrity.is_some());
        assert_eq!(res.cache, PathBuf::from("/home/u/.npm/_cacache"));
    }

    #[test]
    fn test_parse_cache_add_output_manifest_json() {
        let out = r#"{ "name": "bower", "version": "1.8.0", "_integrity": "sha512-aaa" }"#;
        let info = parse_cache_add_output(out, "bower@1.8.0").unwrap();
        assert_eq!(info.name, "bower");
        assert_eq!(info.version, "1.8.0");
        assert_eq!(info.integrity.as_deref(), Some("sha512-aaa"));
    }

    #[test]
    fn test_parse_cache_add_output_silent_with_pinned_spec() {
        let info = parse_cache_add_output("", "left-pad@1.3.0").unwrap();
        assert_eq!(info.name, "left-pad");
        assert_eq!(info.version, "1.3.0");
        assert_eq!(info.integrity, None);
    }

    #[test]
    fn test_parse_cache_add_output_silent_with_range_spec() {
        assert_eq!(parse_cache_add_output("", "left-pad@^1.0.0"), None);
        assert_eq!(parse_cache_add_output("", "left-pad"), None);
    }

    #[test]
    fn test_cache_result_serializes_with_null_fields() {
        let res = CacheResult {
            cache: PathBuf::from("/home/u/.npm/_cacache"),
            name: "left-pad".into(),
            version: "1.3.0".into(),
            path: None,
            integrity: Some(LEFT_PAD_SRI.into()),
        };
        let v = serde_json::to_value(&res).unwrap();
        assert!(v.get("path").unwrap().is_null());
        assert_eq!(v.get("name").and_then(|n| n.as_str()), Some("left-pad"));
    }
}
