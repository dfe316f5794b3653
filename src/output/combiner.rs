//! Combiner: local batches in, one deduplicated corpus out
//!
//! Articles are visited in (batch id, source index) order and the first
//! article with a given content fingerprint wins, so the same batch layout
//! always yields the same corpus byte for byte.

use crate::model::ArticleBatch;
use crate::output::fingerprint::fingerprint;
use crate::output::record::format_record;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A dropped duplicate and the article it duplicated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEntry {
    pub url: String,
    pub duplicate_of: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineStats {
    pub articles_in: usize,
    pub articles_out: usize,
    pub duplicates_removed: usize,
    pub per_category: BTreeMap<String, usize>,
    pub duplicates: Vec<DuplicateEntry>,
}

/// The final corpus text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub text: String,
    pub records: usize,
}

impl Corpus {
    pub fn size_bytes(&self) -> u64 {
        self.text.len() as u64
    }
}

/// Streaming deduplicator
///
/// Batches must be pushed in ascending id order; [`combine`] takes care of
/// that for a whole set.
pub struct Combiner {
    source_name: String,
    seen: HashMap<String, String>,
    text: String,
    stats: CombineStats,
}

impl Combiner {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            seen: HashMap::new(),
            text: String::new(),
            stats: CombineStats::default(),
        }
    }

    pub fn push_batch(&mut self, batch: &ArticleBatch) {
        let mut entries: Vec<_> = batch.articles.iter().collect();
        entries.sort_by_key(|entry| entry.source_index);

        for entry in entries {
            let article = &entry.article;
            self.stats.articles_in += 1;

            let key = fingerprint(&article.body);
            if let Some(first) = self.seen.get(&key) {
                tracing::debug!(url = %article.url, duplicate_of = %first, "Duplicate article dropped");
                self.stats.duplicates_removed += 1;
                self.stats.duplicates.push(DuplicateEntry {
                    url: article.url.clone(),
                    duplicate_of: first.clone(),
                });
                continue;
            }
            self.seen.insert(key, article.url.clone());

            self.text.push_str(&format_record(article, &self.source_name));
            self.stats.articles_out += 1;
            *self
                .stats
                .per_category
                .entry(article.rubrika.clone())
                .or_insert(0) += 1;
        }
    }

    pub fn finish(self) -> (Corpus, CombineStats) {
        let corpus = Corpus {
            text: self.text,
            records: self.stats.articles_out,
        };
        (corpus, self.stats)
    }
}

/// Combines a set of filtered batches in batch id order
pub fn combine(mut batches: Vec<ArticleBatch>, source_name: &str) -> (Corpus, CombineStats) {
    batches.sort_by_key(|batch| batch.batch_id);

    let mut combiner = Combiner::new(source_name);
    for batch in &batches {
        combiner.push_batch(batch);
    }
    combiner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::article;
    use crate::model::BatchedArticle;
    use crate::output::record::RECORD_SEPARATOR;

    fn batch(id: u32, items: &[(usize, &str, &str)]) -> ArticleBatch {
        ArticleBatch {
            batch_id: id,
            articles: items
                .iter()
                .map(|(index, url, body)| BatchedArticle {
                    source_index: *index,
                    article: article(url, body),
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_occurrence_wins_in_batch_then_index_order() {
        let batches = vec![
            batch(2, &[(0, "https://a.hr/c/", "isti tekst")]),
            batch(
                1,
                &[
                    (1, "https://a.hr/b/", "Isti   tekst"),
                    (0, "https://a.hr/a/", "drugi tekst"),
                ],
            ),
        ];

        let (corpus, stats) = combine(batches, "poskok.info");

        assert_eq!(corpus.records, 2);
        assert_eq!(stats.articles_in, 3);
        assert_eq!(stats.duplicates_removed, 1);
        assert_eq!(
            stats.duplicates,
            vec![DuplicateEntry {
                url: "https://a.hr/c/".to_string(),
                duplicate_of: "https://a.hr/b/".to_string(),
            }]
        );

        let a = corpus.text.find("https://a.hr/a/").unwrap();
        let b = corpus.text.find("https://a.hr/b/").unwrap();
        assert!(a < b);
        assert!(!corpus.text.contains("https://a.hr/c/"));
        assert_eq!(corpus.text.matches(RECORD_SEPARATOR).count(), 2);
        assert_eq!(stats.per_category.get("Sport"), Some(&2));
    }

    #[test]
    fn test_deterministic_output() {
        let make = || {
            vec![
                batch(1, &[(0, "https://a.hr/1/", "jedan"), (1, "https://a.hr/2/", "dva")]),
                batch(3, &[(4, "https://a.hr/3/", "tri")]),
            ]
        };
        let (first, _) = combine(make(), "poskok.info");
        let (second, _) = combine(make(), "poskok.info");
        assert_eq!(first, second);
        assert_eq!(first.size_bytes(), first.text.len() as u64);
    }

    #[test]
    fn test_empty_input() {
        let (corpus, stats) = combine(Vec::new(), "poskok.info");
        assert!(corpus.text.is_empty());
        assert_eq!(stats, CombineStats::default());
    }
}
