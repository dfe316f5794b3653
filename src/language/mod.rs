//! Rule-based language filter
//!
//! An article body is split into lowercase alphabetic tokens. Each token
//! counts as foreign when it is in the foreign lexicon and as local when it
//! is in the local lexicon or carries a local diacritic (`č ć ž š đ`).
//!
//! The article is [`Language::Foreign`] when the foreign fraction is
//! strictly greater than `foreign-threshold`. With `accept-mixed-content`,
//! an over-threshold article whose local fraction still reaches
//! `mixed-content-floor` is kept as local and flagged as mixed.

mod lexicon;

pub use lexicon::{FOREIGN_WORDS, LOCAL_WORDS};

use crate::config::LanguageConfig;
use crate::model::ArticleRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Local,
    Foreign,
}

/// Verdict for one article plus the numbers behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub language: Language,
    /// Share of the winning side among matched tokens, in `[0, 1]`
    pub confidence: f64,
    pub foreign_fraction: f64,
    pub local_fraction: f64,
    pub tokens: usize,
    /// Over the foreign threshold but kept because of its local content
    pub mixed: bool,
}

/// Thresholds and lexicons for classification
#[derive(Debug, Clone)]
pub struct LanguagePolicy {
    foreign: HashSet<String>,
    local: HashSet<String>,
    markers: Vec<char>,
    foreign_threshold: f64,
    accept_mixed_content: bool,
    mixed_content_floor: f64,
}

fn word_set<'a>(words: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty() && !w.contains(char::is_whitespace))
        .collect()
}

impl LanguagePolicy {
    pub fn from_config(config: &LanguageConfig) -> Self {
        let foreign = match &config.foreign_words {
            Some(words) => word_set(words.iter().map(String::as_str)),
            None => word_set(FOREIGN_WORDS.iter().copied()),
        };
        let local = match &config.local_words {
            Some(words) => word_set(words.iter().map(String::as_str)),
            None => word_set(LOCAL_WORDS.iter().copied()),
        };

        Self {
            foreign,
            local,
            markers: config.local_markers.to_lowercase().chars().collect(),
            foreign_threshold: config.foreign_threshold,
            accept_mixed_content: config.accept_mixed_content,
            mixed_content_floor: config.mixed_content_floor,
        }
    }

    pub fn classify(&self, article: &ArticleRecord) -> Classification {
        self.classify_text(&article.body)
    }

    pub fn classify_text(&self, text: &str) -> Classification {
        let mut tokens = 0usize;
        let mut foreign = 0usize;
        let mut local = 0usize;

        for token in tokenize(text) {
            tokens += 1;
            if self.foreign.contains(&token) {
                foreign += 1;
            } else if self.local.contains(&token) || token.chars().any(|c| self.markers.contains(&c))
            {
                local += 1;
            }
        }

        let fraction = |count: usize| {
            if tokens == 0 {
                0.0
            } else {
                count as f64 / tokens as f64
            }
        };
        let foreign_fraction = fraction(foreign);
        let local_fraction = fraction(local);

        let over_threshold = foreign_fraction > self.foreign_threshold;
        let mixed = over_threshold
            && self.accept_mixed_content
            && local_fraction >= self.mixed_content_floor;
        let language = if over_threshold && !mixed {
            Language::Foreign
        } else {
            Language::Local
        };

        let matched = foreign_fraction + local_fraction;
        let confidence = if matched == 0.0 {
            0.5
        } else if language == Language::Foreign {
            foreign_fraction / matched
        } else {
            local_fraction / matched
        };

        Classification {
            language,
            confidence,
            foreign_fraction,
            local_fraction,
            tokens,
            mixed,
        }
    }
}

/// Lowercase runs of alphabetic characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
