//! Helpers for npm's `_cacache` content-addressable store.
//!
//! The modern cache branch only reports an integrity hash; these helpers map
//! that hash to the on-disk content file and verify a file against an SRI
//! string.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use base64::Engine;

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Parse an SRI string ("sha512-<base64>", optional ?options suffix) into
/// (algorithm, raw digest bytes).
fn parse_sri(sri: &str) -> Result<(String, Vec<u8>), String> {
    let sri = sri.trim();
    let (algo, rest) = sri
        .split_once('-')
        .ok_or_else(|| format!("invalid integrity string: {}", sri))?;
    let digest_b64 = rest.split_once('?').map(|(d, _)| d).unwrap_or(rest);
    let digest = base64::engine::general_purpose::STANDARD
        .decode(digest_b64.as_bytes())
        .map_err(|e| format!("invalid integrity digest: {}", e))?;
    Ok((algo.to_lowercase(), digest))
}

/// On-disk content file for an integrity hash inside a `_cacache` directory:
/// `content-v2/<algo>/<aa>/<bb>/<rest-of-hex>`.
pub fn content_path(cacache_dir: &Path, sri: &str) -> Result<PathBuf, String> {
    let (algo, digest) = parse_sri(sri)?;
    let hex = hex_encode(&digest);
    if hex.len() < 5 {
        return Err(format!("integrity digest too short: {}", sri));
    }
    Ok(cacache_dir
        .join("content-v2")
        .join(algo)
        .join(&hex[0..2])
        .join(&hex[2..4])
        .join(&hex[4..]))
}

/// Verify a file against an SRI string. Returns true on match.
pub fn verify_sri(path: &Path, sri: &str) -> bool {
    let Ok((algo, expected)) = parse_sri(sri) else {
        return false;
    };
    let mut f = match File::open(path) {
        Ok(x) => x,
        Err(_) => return false,
    };
    let mut buf = [0u8; 8192];
    match algo.as_str() {
        "sha512" => {
            use sha2::{Digest, Sha512};
            let mut hasher = Sha512::new();
            loop {
                let n = match f.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(_) => return false,
                };
                hasher.update(&buf[..n]);
            }
            hasher.finalize().as_slice() == expected.as_slice()
        }
        "sha384" => {
            use sha2::{Digest, Sha384};
            let mut hasher = Sha384::new();
            loop {
                let n = match f.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(_) => return false,
                };
                hasher.update(&buf[..n]);
            }
            hasher.finalize().as_slice() == expected.as_slice()
        }
        _ => false,
    }
}
