//! Article extraction
//!
//! Turns a fetched article page into an [`ArticleRecord`]. The batch
//! processor only sees the [`ArticleParser`] trait, so a site with unusual
//! markup can plug in its own parser.

mod date;
mod html;

pub use date::parse_date;
pub use html::HtmlArticleParser;

use crate::model::ArticleRecord;
use thiserror::Error;

/// The page was fetched but holds no usable article
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Extracts an article from raw page bytes
pub trait ArticleParser: Send + Sync {
    fn parse(&self, url: &str, html: &[u8]) -> Result<ArticleRecord, ParseError>;
}
