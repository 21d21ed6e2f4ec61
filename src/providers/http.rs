// src/providers/http.rs

use crate::providers::ProviderError;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const BACKOFF_STEP_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 4_000;
const JITTER_MAX_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    /// Total tries per request, including the first.
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_attempts: 2,
        }
    }
}

/// Blocking GET with bounded retry. Shared by every provider client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
        })
    }

    pub fn get_json(&self, url: &Url, headers: &HeaderMap) -> Result<Value, ProviderError> {
        let text = self.get_text(url, headers)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Only `Unavailable` is retried; a block or a bad payload will not
    /// improve on a second try.
    pub fn get_text(&self, url: &Url, headers: &HeaderMap) -> Result<String, ProviderError> {
        let mut last_err = None;

        for attempt in 1..=self.max_attempts {
            let start = Instant::now();

            match self.try_get_text(url, headers) {
                Ok(text) => {
                    debug!(host = url.host_str(), attempt, elapsed = ?start.elapsed(), "fetched");
                    return Ok(text);
                }
                Err(e @ ProviderError::Unavailable(_)) => {
                    warn!(host = url.host_str(), attempt, elapsed = ?start.elapsed(), error = %e, "request failed");
                    last_err = Some(e);

                    if attempt < self.max_attempts {
                        let base = (BACKOFF_STEP_MS * u64::from(attempt)).min(MAX_BACKOFF_MS);
                        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MS);
                        std::thread::sleep(Duration::from_millis(base + jitter));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ProviderError::Unavailable("retry loop exhausted".into())))
    }

    fn try_get_text(&self, url: &Url, headers: &HeaderMap) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(url.as_str())
            .headers(headers.clone())
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        match status {
            s if s.is_success() => Ok(text),
            StatusCode::FORBIDDEN => Err(ProviderError::Blocked(format!(
                "{} returned 403",
                url.host_str().unwrap_or("provider")
            ))),
            s => Err(ProviderError::Unavailable(format!("HTTP {s}"))),
        }
    }
}

/// `x-rapidapi-key` / `x-rapidapi-host` pair used by the hosted APIs.
pub fn rapidapi_headers(api_key: &str, host: &str) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-rapidapi-key"),
        HeaderValue::from_str(api_key)
            .map_err(|_| ProviderError::Malformed("api key is not a valid header value".into()))?,
    );
    headers.insert(
        HeaderName::from_static("x-rapidapi-host"),
        HeaderValue::from_str(host)
            .map_err(|_| ProviderError::Malformed("host is not a valid header value".into()))?,
    );
    Ok(headers)
}

pub fn endpoint(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, ProviderError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse_with_params(&raw, params).map_err(|e| ProviderError::Malformed(e.to_string()))
}
