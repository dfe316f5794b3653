//! HTTP fetcher implementation
//!
//! This module handles every HTTP request the harvester makes:
//! - Building the HTTP client with the configured user agent and timeout
//! - Waiting at the global politeness gate before each attempt
//! - Classifying each attempt as success, transient or terminal failure
//! - Retrying transient failures with exponential backoff
//!
//! # Classification
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | 2xx | Success |
//! | Timeout | Transient → retry |
//! | Connection error | Transient → retry |
//! | HTTP 5xx | Transient → retry |
//! | HTTP 429 | Transient → retry |
//! | HTTP 404 | Terminal: `NotFound` |
//! | Other HTTP status | Terminal: `HttpError(status)` |
//!
//! A transient failure that exhausts the retry budget becomes terminal with
//! the last error kind.

use crate::config::{Config, UserAgentConfig};
use crate::crawler::backoff::{Backoff, RetryPolicy};
use crate::crawler::politeness::PolitenessGate;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a single fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("HTTP status {0}")]
    HttpError(u16),

    #[error("not found (404)")]
    NotFound,
}

impl FetchError {
    /// Returns true if another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionError(_) => true,
            Self::HttpError(status) => *status == 429 || (500..600).contains(status),
            Self::NotFound => false,
        }
    }
}

/// Terminal result of a fetch after retries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} after {attempts} attempt(s)")]
pub struct FetchFailure {
    pub kind: FetchError,
    pub attempts: u32,
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    pub body: Vec<u8>,
    /// Attempts it took, first try included
    pub attempts: u32,
}

impl FetchedPage {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Outcome of one attempt
enum Attempt {
    Ok(FetchedPage),
    Transient(FetchError),
    Terminal(FetchError),
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is formatted as `Name/Version (+ContactURL; ContactEmail)`.
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches URLs with retry, backoff and global politeness
///
/// Cheap to share: wrap it in an `Arc` and hand a clone to every worker.
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    gate: Arc<PolitenessGate>,
    user_agent: String,
}

impl Fetcher {
    /// Creates a fetcher from the run configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs_f64(config.fetch.timeout),
        )?;
        Ok(Self {
            client,
            policy: RetryPolicy::from_config(&config.fetch),
            gate: Arc::new(PolitenessGate::from_config(&config.fetch)),
            user_agent: config.user_agent.header_value(),
        })
    }

    /// Creates a fetcher from explicit parts
    pub fn with_parts(
        client: Client,
        policy: RetryPolicy,
        gate: Arc<PolitenessGate>,
        user_agent: String,
    ) -> Self {
        Self {
            client,
            policy,
            gate,
            user_agent,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn gate(&self) -> &Arc<PolitenessGate> {
        &self.gate
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - The page body and final URL
    /// * `Err(FetchFailure)` - Terminal failure with the number of attempts made
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
        let mut backoff = Backoff::new(&self.policy);

        loop {
            self.gate.wait_turn().await;

            match self.attempt(url).await {
                Attempt::Ok(mut page) => {
                    page.attempts = backoff.attempts() + 1;
                    return Ok(page);
                }
                Attempt::Terminal(kind) => {
                    tracing::debug!(url, "Terminal fetch failure: {}", kind);
                    return Err(FetchFailure {
                        kind,
                        attempts: backoff.attempts() + 1,
                    });
                }
                Attempt::Transient(kind) => match backoff.record_failure() {
                    Some(delay) => {
                        tracing::warn!(
                            url,
                            attempt = backoff.attempts(),
                            "Transient fetch failure ({}), retrying in {:?}",
                            kind,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::warn!(
                            url,
                            attempts = backoff.attempts(),
                            "Retry budget exhausted: {}",
                            kind
                        );
                        return Err(FetchFailure {
                            kind,
                            attempts: backoff.attempts(),
                        });
                    }
                },
            }
        }
    }

    async fn attempt(&self, url: &str) -> Attempt {
        tracing::debug!(url, "GET");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Attempt::Terminal(FetchError::ConnectionError(e.to_string()))
            }
            Err(e) => return Attempt::Transient(classify_reqwest_error(&e)),
        };

        let status = response.status();
        if let Some(error) = classify_status(status) {
            return if error.is_transient() {
                Attempt::Transient(error)
            } else {
                Attempt::Terminal(error)
            };
        }

        let final_url = response.url().to_string();
        match response.bytes().await {
            Ok(body) => Attempt::Ok(FetchedPage {
                url: url.to_string(),
                final_url,
                status: status.as_u16(),
                body: body.to_vec(),
                attempts: 1,
            }),
            Err(e) => Attempt::Transient(classify_reqwest_error(&e)),
        }
    }
}

/// Maps a response status to an error, `None` for success
fn classify_status(status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(FetchError::NotFound)
    } else {
        Some(FetchError::HttpError(status.as_u16()))
    }
}

fn classify_reqwest_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::ConnectionError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            create_test_config().header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::ConnectionError("reset".to_string()).is_transient());
        assert!(FetchError::HttpError(500).is_transient());
        assert!(FetchError::HttpError(503).is_transient());
        assert!(FetchError::HttpError(429).is_transient());

        assert!(!FetchError::NotFound.is_transient());
        assert!(!FetchError::HttpError(403).is_transient());
        assert!(!FetchError::HttpError(410).is_transient());
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), None);
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Some(FetchError::NotFound)
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Some(FetchError::HttpError(503))
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = FetchFailure {
            kind: FetchError::HttpError(503),
            attempts: 3,
        };
        assert_eq!(failure.to_string(), "HTTP status 503 after 3 attempt(s)");
    }
}
