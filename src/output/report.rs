//! Run report
//!
//! Built by the combine stage from durable state only (batch index,
//! checkpoints, filter summary, combine statistics), so it can be produced
//! by a run that did not collect or process anything itself.

use crate::crawler::FailedPage;
use crate::output::combiner::{CombineStats, Corpus};
use crate::output::{OutputError, OutputResult};
use crate::state::BatchStatus;
use crate::storage::{write_json_atomic, Checkpoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Language filter totals, persisted as `filtered/filter_summary.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSummary {
    pub batches: Vec<u32>,
    pub articles_in: usize,
    pub local: usize,
    pub foreign: usize,
    pub mixed: usize,
    pub foreign_urls: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A link that ended without an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub batch_id: u32,
    pub url: String,
    pub reason: String,
    pub attempts: u32,
}

/// Per-batch line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub id: u32,
    pub status: BatchStatus,
    pub links: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub soft_rejected: usize,
}

/// Everything a run produced, persisted as `final/report.json`
///
/// Field names are written in snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub config_hash: String,

    pub links_collected: usize,
    pub links_processed: usize,
    pub articles_extracted: usize,
    pub links_failed: usize,
    pub links_soft_rejected: usize,

    pub articles_local: usize,
    pub articles_foreign: usize,
    pub articles_mixed: usize,

    pub duplicates_removed: usize,
    pub final_articles: usize,
    pub output_bytes: u64,
    pub per_category: BTreeMap<String, usize>,

    pub batches: Vec<BatchSummary>,
    pub failures: Vec<FailureEntry>,
    #[serde(default)]
    pub failed_listing_pages: Vec<FailedPage>,
}

impl RunReport {
    /// Assembles the report from the durable outputs of every stage
    pub fn build(
        source: &str,
        config_hash: &str,
        links_collected: usize,
        checkpoints: &[Checkpoint],
        filter: &FilterSummary,
        combined: (&Corpus, &CombineStats),
        failed_listing_pages: Vec<FailedPage>,
    ) -> Self {
        let (corpus, stats) = combined;

        let mut batches = Vec::with_capacity(checkpoints.len());
        let mut failures = Vec::new();
        for cp in checkpoints {
            batches.push(BatchSummary {
                id: cp.batch_id,
                status: cp.status,
                links: cp.total_links,
                succeeded: cp.succeeded,
                failed: cp.failed_urls.len(),
                soft_rejected: cp.soft_rejected.len(),
            });
            failures.extend(cp.failed_urls.iter().map(|f| FailureEntry {
                batch_id: cp.batch_id,
                url: f.url.clone(),
                reason: f.error.to_string(),
                attempts: f.attempts,
            }));
        }

        let articles_extracted = batches.iter().map(|b| b.succeeded).sum();
        let links_failed = failures.len();
        let links_soft_rejected = batches.iter().map(|b| b.soft_rejected).sum();

        Self {
            generated_at: Utc::now(),
            source: source.to_string(),
            config_hash: config_hash.to_string(),
            links_collected,
            links_processed: articles_extracted + links_failed + links_soft_rejected,
            articles_extracted,
            links_failed,
            links_soft_rejected,
            articles_local: filter.local,
            articles_foreign: filter.foreign,
            articles_mixed: filter.mixed,
            duplicates_removed: stats.duplicates_removed,
            final_articles: corpus.records,
            output_bytes: corpus.size_bytes(),
            per_category: stats.per_category.clone(),
            batches,
            failures,
            failed_listing_pages,
        }
    }

    pub fn write_json(&self, path: &Path) -> OutputResult<()> {
        write_json_atomic(path, self).map_err(OutputError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::link;
    use crate::model::LinkBatch;
    use crate::state::{FailedUrl, FailureKind, SoftReject};

    fn checkpoint() -> Checkpoint {
        let batch = LinkBatch {
            id: 2,
            links: (0..4)
                .map(|i| link(&format!("https://a.hr/{}/", i)))
                .collect(),
        };
        let mut cp = Checkpoint::new(&batch);
        cp.status = BatchStatus::Completed;
        cp.last_processed_index = 4;
        cp.processed_count = 4;
        cp.succeeded = 2;
        cp.failed_urls.push(FailedUrl {
            url: "https://a.hr/1/".to_string(),
            index: 1,
            error: FailureKind::HttpError { status: 503 },
            attempts: 5,
        });
        cp.soft_rejected.push(SoftReject {
            url: "https://a.hr/3/".to_string(),
            index: 3,
            content_length: 10,
        });
        cp
    }

    #[test]
    fn test_build_totals() {
        let filter = FilterSummary {
            local: 2,
            ..Default::default()
        };
        let corpus = Corpus {
            text: "x".repeat(42),
            records: 2,
        };
        let stats = CombineStats {
            articles_in: 2,
            articles_out: 2,
            ..Default::default()
        };

        let report = RunReport::build(
            "poskok.info",
            "abc",
            4,
            &[checkpoint()],
            &filter,
            (&corpus, &stats),
            Vec::new(),
        );

        assert_eq!(report.links_processed, 4);
        assert_eq!(report.articles_extracted, 2);
        assert_eq!(report.links_failed, 1);
        assert_eq!(report.links_soft_rejected, 1);
        assert_eq!(report.output_bytes, 42);
        assert_eq!(report.failures[0].reason, "http_503");
        assert_eq!(report.failures[0].batch_id, 2);
    }

    #[test]
    fn test_json_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let corpus = Corpus {
            text: String::new(),
            records: 0,
        };
        let report = RunReport::build(
            "poskok.info",
            "abc",
            0,
            &[],
            &FilterSummary::default(),
            (&corpus, &CombineStats::default()),
            Vec::new(),
        );
        report.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"duplicates_removed\": 0"));
        assert!(text.contains("\"failed_listing_pages\": []"));
        let back: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
    }
}
