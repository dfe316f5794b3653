//! Records that flow between pipeline stages
//!
//! Links are discovered by the collector and sealed into [`LinkBatch`]es;
//! the batch processor turns each link into at most one [`ArticleRecord`],
//! kept in an [`ArticleBatch`] together with the link's position so the
//! combiner can order articles deterministically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A discovered article URL and where it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Canonical URL (see [`crate::url::normalize_url`])
    pub url: String,

    /// Category (or `Arhiva` for month archive walks)
    pub category: String,

    /// Year of the walk, or the year found in the URL path
    pub year: Option<i32>,

    /// Listing page number the link was found on (1-based)
    pub discovered_at_page: u32,

    /// Anchor text, when the listing had any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A sealed, immutable group of links processed as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBatch {
    pub id: u32,
    pub links: Vec<LinkRecord>,
}

impl LinkBatch {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Hex SHA-256 over the batch's URLs in order
    ///
    /// A checkpoint stores the digest of the batch it was written for, so a
    /// re-collected batch with the same id is never resumed from a stale
    /// position.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for link in &self.links {
            hasher.update(link.url.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

/// Publication date: parsed form when recognisable, plus the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDate {
    pub iso: Option<NaiveDate>,
    pub original: String,
}

impl ArticleDate {
    /// `dd.mm.yyyy` when parsed, else the original text, else `N/A`
    pub fn display(&self) -> String {
        match self.iso {
            Some(date) => date.format("%d.%m.%Y").to_string(),
            None if !self.original.trim().is_empty() => self.original.trim().to_string(),
            None => "N/A".to_string(),
        }
    }
}

/// One extracted article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub overline: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Section name as printed by the site
    pub rubrika: String,
    pub date: ArticleDate,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub raw_metadata: BTreeMap<String, String>,
}

impl ArticleRecord {
    /// Body length in characters, the unit of the content length bounds
    pub fn content_length(&self) -> usize {
        self.body.chars().count()
    }
}

/// An article plus its index within the source link batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchedArticle {
    pub source_index: usize,
    pub article: ArticleRecord,
}

/// The articles produced from one link batch, ordered by source index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleBatch {
    pub batch_id: u32,
    pub articles: Vec<BatchedArticle>,
}

impl ArticleBatch {
    pub fn new(batch_id: u32) -> Self {
        Self {
            batch_id,
            articles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Restores source order after out-of-order completion
    pub fn sort(&mut self) {
        self.articles.sort_by_key(|a| a.source_index);
    }
}
