//! HTTP client for registry calls: one shared Agent (connection reuse),
//! bounded retries for transient failures.

use std::io::Read;
use std::time::Duration;

const REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_COUNT: usize = 2;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;
const MAX_IDLE_PER_HOST: usize = 8;

fn retry_count_from_env() -> usize {
    std::env::var("NPMU_HTTP_RETRIES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_RETRY_COUNT)
}

fn retry_backoff_ms_from_env() -> u64 {
    std::env::var("NPMU_HTTP_RETRY_BACKOFF_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_BACKOFF_MS)
}

struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .max_idle_connections(MAX_IDLE_PER_HOST)
            .build();
        Self { agent }
    }

    fn get_bytes(
        &self,
        url: &str,
        bearer_token: Option<&str>,
        accept: Option<&str>,
    ) -> Result<Vec<u8>, String> {
        let resp = self.send_with_retry(|| {
            let mut req = self.agent.get(url);
            if let Some(h) = accept {
                req = req.set("Accept", h);
            }
            match bearer_token {
                Some(token) if !token.is_empty() => {
                    req.set("Authorization", &format!("Bearer {}", token)).call()
                }
                _ => req.call(),
            }
        })?;
        let hint = resp
            .header("Content-Length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut buf = Vec::with_capacity(if hint > 0 { hint } else { 16 * 1024 });
        resp.into_reader()
            .read_to_end(&mut buf)
            .map_err(|e| e.to_string())?;
        Ok(buf)
    }

    fn send_with_retry<F>(&self, mut send: F) -> Result<ureq::Response, String>
    where
        F: FnMut() -> Result<ureq::Response, ureq::Error>,
    {
        let retries = retry_count_from_env();
        let mut attempt = 0usize;
        let mut backoff = retry_backoff_ms_from_env();
        loop {
            attempt += 1;
            match send() {
                Ok(resp) => return Ok(resp),
                Err(ureq::Error::Status(code, _resp)) => {
                    if attempt <= retries && (code >= 500 || code == 429) {
                        std::thread::sleep(Duration::from_millis(backoff));
                        backoff = backoff.saturating_mul(2).min(5_000);
                        continue;
                    }
                    return Err(format!("HTTP {}", code));
                }
                Err(e) => {
                    if attempt <= retries {
                        std::thread::sleep(Duration::from_millis(backoff));
                        backoff = backoff.saturating_mul(2).min(5_000);
                        continue;
                    }
                    return Err(e.to_string());
                }
            }
        }
    }
}

static CLIENT: std::sync::OnceLock<HttpClient> = std::sync::OnceLock::new();

fn get_global() -> &'static HttpClient {
    CLIENT.get_or_init(HttpClient::new)
}

/// GET url with optional bearer token, return body bytes (shared Agent).
pub fn get_bytes_with_bearer(url: &str, bearer_token: Option<&str>) -> Result<Vec<u8>, String> {
    get_global().get_bytes(url, bearer_token, None)
}

/// GET url with optional bearer token and Accept header (e.g.
/// application/vnd.npm.install-v1+json for abbreviated packuments).
pub fn get_bytes_with_accept(
    url: &str,
    bearer_token: Option<&str>,
    accept: Option<&str>,
) -> Result<Vec<u8>, String> {
    get_global().get_bytes(url, bearer_token, accept)
}
