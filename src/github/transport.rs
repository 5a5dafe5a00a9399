// src/github/transport.rs
// =============================================================================
// The HTTP seam between the fetcher and the network.
//
// The fetcher never talks to reqwest directly. It asks a Transport for
// "GET this URL" and gets back the status code and body. That keeps all the
// interesting decisions (which endpoint, what a 404 means, base64 decoding)
// in the fetcher, and lets tests swap in an in-memory transport.
//
// Error mapping:
// - request exceeded the per-call timeout -> AcquireError::Timeout
// - anything else that prevented a response -> AcquireError::Network
// - any HTTP status (including 4xx/5xx) is NOT an error at this layer
// =============================================================================

use crate::error::{AcquireError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
    /// Value of the x-ratelimit-remaining header, when present
    pub rate_limit_remaining: Option<u32>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// 403 and 429 both mean "you are not getting this right now"
    pub fn is_denied(&self) -> bool {
        self.status == 403 || self.status == 429
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429 || self.rate_limit_remaining == Some(0)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET. Only failures to obtain a response are errors.
    async fn get(&self, url: &Url) -> Result<Reply>;
}

/// Transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        // GitHub's API rejects requests without a User-Agent
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AcquireError::Network(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Reply> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        let status = response.status().as_u16();
        let rate_limit_remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = response
            .bytes()
            .await
            .map_err(|e| categorize_error(url, e))?
            .to_vec();

        debug!(%url, status, bytes = body.len(), "response");

        Ok(Reply {
            status,
            body,
            rate_limit_remaining,
        })
    }
}

fn categorize_error(url: &Url, error: reqwest::Error) -> AcquireError {
    if error.is_timeout() {
        AcquireError::Timeout(url.to_string())
    } else if error.is_connect() {
        AcquireError::Network(format!("connection failed for {}", url))
    } else {
        AcquireError::Network(format!("{}: {}", url, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, remaining: Option<u32>) -> Reply {
        Reply {
            status,
            body: Vec::new(),
            rate_limit_remaining: remaining,
        }
    }

    #[test]
    fn test_reply_status_classes() {
        assert!(reply(200, None).is_success());
        assert!(reply(404, None).is_not_found());
        assert!(reply(403, None).is_denied());
        assert!(reply(429, None).is_denied());
        assert!(!reply(500, None).is_denied());
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(reply(403, Some(0)).is_rate_limited());
        assert!(!reply(403, Some(12)).is_rate_limited());
        assert!(reply(429, None).is_rate_limited());
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new("repo-intake-test", Duration::from_secs(1)).is_ok());
    }
}
