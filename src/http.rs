//! Blocking HTTP client shared by the web-service clients, with a request
//! timeout and bounded retry.

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use std::thread;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{Result, RouteError};

const BACKOFF_BASE_MS: u64 = 100;

pub struct HttpClient {
    client: Client,
    max_retries: u32,
    request_timeout: Duration,
}

impl HttpClient {
    pub fn new(request_timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            max_retries,
            request_timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.request_timeout(), config.max_retries)
    }

    /// GET `url` and return the body of a 2xx response.
    pub fn get_text(&self, url: &Url) -> Result<String> {
        let resp = self.execute_with_retry(url)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RouteError::Status {
                status: status.as_u16(),
                url: redact(url),
            });
        }
        Ok(resp.text().map_err(|e| e.without_url())?)
    }

    // Only timeouts and connect failures are retried, with exponential
    // backoff. Anything else goes straight back to the caller.
    fn execute_with_retry(&self, url: &Url) -> std::result::Result<Response, reqwest::Error> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let backoff_ms = BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                thread::sleep(Duration::from_millis(backoff_ms));
            }
            match self.client.get(url.clone()).send() {
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    warn!(
                        "[http] attempt {} for {} failed: {}",
                        attempt + 1,
                        redact(url),
                        e.without_url()
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.without_url()),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// `url` with the API key masked, for logs and error messages.
pub fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return redacted.to_string();
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Builds `{base_url}/{path}?{params}`.
pub fn build_url(base_url: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
    let raw = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse_with_params(&raw, params)
        .map_err(|e| RouteError::Other(format!("invalid url {raw}: {e}")))
}
