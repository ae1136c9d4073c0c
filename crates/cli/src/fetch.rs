//! HTTP feed fetcher.
//!
//! One blocking GET per source with a bounded timeout. No retries: a source
//! that fails is skipped for this run and picked up again on the next one.

use std::io::Read;
use std::time::Duration;

use carfeed_core::{FeedError, Fetcher, RawBody};
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

pub const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024; // 10 MB
const USER_AGENT: &str = concat!("carfeed/", env!("CARGO_PKG_VERSION"));
const ACCEPT_FEEDS: &str = "application/json, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.5";

// ── HttpFetcher ─────────────────────────────────────────────────────

pub struct HttpFetcher {
    http: reqwest::blocking::Client,
    timeout: Duration,
    max_bytes: usize,
    quiet: bool,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, quiet: bool) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: exit_codes::EXIT_ERROR,
                message: format!("cannot build HTTP client: {e}"),
                hint: None,
            })?;

        Ok(Self {
            http,
            timeout,
            max_bytes: MAX_RESPONSE_BYTES,
            quiet,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RawBody, FeedError> {
        let fail = |message: String| FeedError::Fetch {
            url: url.to_string(),
            message,
        };

        if !self.quiet {
            eprintln!("Fetching {url}...");
        }

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, ACCEPT_FEEDS)
            .send()
            .map_err(|e| fail(self.describe(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }

        if let Some(len) = resp.content_length() {
            if len > self.max_bytes as u64 {
                return Err(fail(format!(
                    "response too large ({len} bytes, max {} bytes)",
                    self.max_bytes
                )));
            }
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        resp.take(self.max_bytes as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| fail(format!("cannot read response body: {e}")))?;
        if bytes.len() > self.max_bytes {
            return Err(fail(format!(
                "response too large (more than {} bytes)",
                self.max_bytes
            )));
        }

        log::debug!("{url}: {} bytes, content-type {:?}", bytes.len(), content_type);
        Ok(RawBody {
            bytes,
            content_type,
        })
    }
}
