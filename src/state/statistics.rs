use serde::{Deserialize, Serialize};

/// Counters for one invocation of the pipeline
///
/// Each stage takes `&mut RunStatistics` and bumps its own counters; the
/// binary logs the totals when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub listing_pages_fetched: u64,
    pub listing_pages_failed: u64,
    pub links_discovered: u64,
    pub links_already_known: u64,
    pub batches_sealed: u64,

    pub batches_processed: u64,
    pub batches_skipped: u64,
    pub articles_extracted: u64,
    pub links_failed: u64,
    pub links_soft_rejected: u64,

    pub articles_local: u64,
    pub articles_foreign: u64,
    pub articles_mixed: u64,

    pub duplicates_removed: u64,
    pub final_articles: u64,
}

impl RunStatistics {
    /// Terminal outcomes recorded by the batch processor this run
    pub fn links_processed(&self) -> u64 {
        self.articles_extracted + self.links_failed + self.links_soft_rejected
    }

    pub fn log_summary(&self) {
        tracing::info!(
            pages = self.listing_pages_fetched,
            page_errors = self.listing_pages_failed,
            links = self.links_discovered,
            known = self.links_already_known,
            sealed = self.batches_sealed,
            "Collection totals"
        );
        tracing::info!(
            batches = self.batches_processed,
            skipped = self.batches_skipped,
            articles = self.articles_extracted,
            failed = self.links_failed,
            soft_rejected = self.links_soft_rejected,
            "Processing totals"
        );
        tracing::info!(
            local = self.articles_local,
            foreign = self.articles_foreign,
            mixed = self.articles_mixed,
            duplicates = self.duplicates_removed,
            final_count = self.final_articles,
            "Filter and combine totals"
        );
    }
}
