use crate::model::LinkBatch;
use crate::state::{BatchStatus, FailedUrl, SoftReject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable progress of one link batch
///
/// `last_processed_index` is an exclusive watermark: every link with an index
/// below it has a recorded terminal outcome. A resumed run processes
/// `[last_processed_index, total_links)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub batch_id: u32,
    /// Digest of the link batch this checkpoint belongs to
    pub batch_digest: String,
    pub total_links: usize,
    /// Terminal outcomes recorded so far, including ones past the watermark
    pub processed_count: usize,
    pub last_processed_index: usize,
    pub status: BatchStatus,
    #[serde(default)]
    pub succeeded: usize,
    #[serde(default)]
    pub failed_urls: Vec<FailedUrl>,
    #[serde(default)]
    pub soft_rejected: Vec<SoftReject>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// A fresh checkpoint for a batch that has not been started
    pub fn new(batch: &LinkBatch) -> Self {
        let now = Utc::now();
        Self {
            batch_id: batch.id,
            batch_digest: batch.digest(),
            total_links: batch.len(),
            processed_count: 0,
            last_processed_index: 0,
            status: BatchStatus::InProgress,
            succeeded: 0,
            failed_urls: Vec::new(),
            soft_rejected: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this checkpoint was written for exactly this batch
    pub fn matches(&self, batch: &LinkBatch) -> bool {
        self.batch_id == batch.id
            && self.total_links == batch.len()
            && self.batch_digest == batch.digest()
    }

    /// Drops every outcome at or past the watermark
    ///
    /// Those links will be processed again, so their earlier outcomes must
    /// not be counted twice.
    pub fn rewind_to_watermark(&mut self) {
        let watermark = self.last_processed_index;
        self.failed_urls.retain(|f| f.index < watermark);
        self.soft_rejected.retain(|s| s.index < watermark);
        self.succeeded = watermark
            .saturating_sub(self.failed_urls.len())
            .saturating_sub(self.soft_rejected.len());
        self.processed_count = watermark;
        if self.status != BatchStatus::Completed {
            self.status = BatchStatus::InProgress;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
