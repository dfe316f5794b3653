//! Terminal failure and soft-reject records kept in checkpoints

use crate::crawler::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a link ended without an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    ConnectionError,
    HttpError { status: u16 },
    NotFound,
    /// The page was fetched but the extractor could not make an article of it
    ParseFailure { reason: String, excerpt: String },
}

impl FailureKind {
    /// Short label used in reports and logs
    pub fn label(&self) -> String {
        match self {
            Self::Timeout => "timeout".to_string(),
            Self::ConnectionError => "connection_error".to_string(),
            Self::HttpError { status } => format!("http_{}", status),
            Self::NotFound => "not_found".to_string(),
            Self::ParseFailure { .. } => "parse_failure".to_string(),
        }
    }
}

impl From<&FetchError> for FailureKind {
    fn from(error: &FetchError) -> Self {
        match error {
            FetchError::Timeout => Self::Timeout,
            FetchError::ConnectionError(_) => Self::ConnectionError,
            FetchError::HttpError(status) => Self::HttpError { status: *status },
            FetchError::NotFound => Self::NotFound,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailure { reason, .. } => write!(f, "parse_failure: {}", reason),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// A link that reached a terminal failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUrl {
    pub url: String,
    pub index: usize,
    pub error: FailureKind,
    pub attempts: u32,
}

/// A fetched and parsed article whose body length fell outside the bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftReject {
    pub url: String,
    pub index: usize,
    pub content_length: usize,
}
