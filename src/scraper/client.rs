//! Blocking HTTP client with an explicit timeout and optional retries for transient failures.

use crate::scraper::error::ScraperError;
use crate::scraper::Fetch;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("ieltscrape/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// Default number of attempts for a fetch (initial plus retries). One means no retry.
const DEFAULT_RETRY_COUNT: u32 = 1;
/// Default backoff delays in seconds after each failed attempt.
const DEFAULT_BACKOFF_SECS: [u64; 3] = [1, 2, 4];

/// Blocking HTTP client used for listing and detail pages.
#[derive(Debug)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
    timeout_secs: u64,
    retry_count: u32,
    backoff_secs: Vec<u64>,
}

impl HttpClient {
    /// Build a client with default User-Agent, timeout, and no retries.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// Retries on timeout, connection errors, HTTP 5xx, and HTTP 429 while attempts remain, waiting
    /// the configured backoff between attempts. Other failures are returned immediately.
    pub fn get_text(&self, url: &str) -> Result<String, ScraperError> {
        let max_attempts = self.retry_count.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let last_attempt = attempt >= max_attempts;
            tracing::debug!(url, attempt, "GET");
            match self.inner.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        // The request timeout also covers the body read.
                        return response.text().map_err(|e| {
                            if e.is_timeout() {
                                self.classify(url, e)
                            } else {
                                ScraperError::BodyRead {
                                    url: url.to_string(),
                                    source: e,
                                }
                            }
                        });
                    }
                    let retryable = status.is_server_error() || status.as_u16() == 429;
                    if !retryable || last_attempt {
                        return Err(ScraperError::HttpStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    let backoff = pick_backoff(&self.backoff_secs, attempt);
                    tracing::debug!(url, status = status.as_u16(), backoff, "retrying");
                    std::thread::sleep(Duration::from_secs(backoff));
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect();
                    if !retryable || last_attempt {
                        return Err(self.classify(url, e));
                    }
                    let backoff = pick_backoff(&self.backoff_secs, attempt);
                    tracing::debug!(url, error = %e, backoff, "retrying");
                    std::thread::sleep(Duration::from_secs(backoff));
                }
            }
        }
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> ScraperError {
        if e.is_timeout() {
            ScraperError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ScraperError::Network {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

impl Fetch for HttpClient {
    fn fetch(&mut self, url: &str) -> Result<String, ScraperError> {
        self.get_text(url)
    }
}

/// Backoff before the retry following `attempt` (1-based). Reuses the last value when short.
fn pick_backoff(secs: &[u64], attempt: u32) -> u64 {
    let i = attempt.saturating_sub(1) as usize;
    secs.get(i)
        .or_else(|| secs.last())
        .copied()
        .unwrap_or(1)
}

/// Builder for [HttpClient] with optional User-Agent, timeout, and retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
    retry_count: u32,
    retry_backoff_secs: Vec<u64>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff_secs: DEFAULT_BACKOFF_SECS.to_vec(),
        }
    }
}

impl HttpClientBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Request timeout in seconds. Default 30. Zero is raised to one.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    /// Number of attempts for transient failures (default 1).
    pub fn retry_count(mut self, n: u32) -> Self {
        self.retry_count = n.max(1);
        self
    }

    /// Backoff delays in seconds before each retry (e.g. [1, 2, 4]). If shorter than needed, the last value is reused.
    pub fn retry_backoff_secs(mut self, secs: Vec<u64>) -> Self {
        self.retry_backoff_secs = secs;
        self
    }

    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(HttpClient {
            inner,
            timeout_secs: self.timeout_secs,
            retry_count: self.retry_count,
            backoff_secs: self.retry_backoff_secs,
        })
    }
}
