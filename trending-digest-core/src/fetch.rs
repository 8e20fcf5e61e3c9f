//! HTTP page fetching over reqwest.
//!
//! [`HttpPageFetcher`] backs both the listing request and the per-project
//! detail requests. Each request carries its own timeout, and each failure
//! maps to its own [`DigestError`] fetch variant.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::contract::PageFetcher;
use crate::error::DigestError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// reqwest-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, DigestError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DigestError::FetchTransport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, DigestError> {
        debug!(url, timeout_ms = timeout.as_millis() as u64, "Fetching page");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = %status, "Page fetch returned non-success status");
            return Err(DigestError::FetchHttpError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify(url, timeout, e))?;
        debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

fn classify(url: &str, timeout: Duration, e: reqwest::Error) -> DigestError {
    if e.is_timeout() {
        DigestError::FetchTimeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        DigestError::FetchTransport {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
