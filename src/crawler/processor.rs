//! Batch processor
//!
//! Fetches and extracts every link of one sealed batch with a bounded
//! worker pool, keeping a durable checkpoint so an interrupted batch
//! resumes where it stopped.
//!
//! # Layout
//!
//! ```text
//! feeder --jobs--> worker 1..N --completions--> aggregator
//! ```
//!
//! Workers share one job receiver and never touch state. The aggregator is
//! the only owner of the checkpoint and the article batch: it advances the
//! watermark, buffers articles, and persists the article file followed by
//! the checkpoint every `checkpoint-interval` completions and whenever
//! `batch-size` new articles are buffered.

use crate::config::ProcessingConfig;
use crate::crawler::fetcher::Fetcher;
use crate::extract::ArticleParser;
use crate::model::{ArticleBatch, ArticleRecord, BatchedArticle, LinkBatch, LinkRecord};
use crate::state::{BatchStatus, FailedUrl, FailureKind, RunStatistics, SoftReject};
use crate::storage::{ArticleBatchStore, Checkpoint, CheckpointStore, StorageError};
use crate::Result;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Characters of page source kept with a parse failure
const EXCERPT_CHARS: usize = 200;

/// Knobs of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorSettings {
    pub max_workers: usize,
    pub batch_size: usize,
    pub checkpoint_interval: usize,
    pub min_content_length: usize,
    pub max_content_length: usize,
}

impl From<&ProcessingConfig> for ProcessorSettings {
    fn from(config: &ProcessingConfig) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            batch_size: config.batch_size.max(1),
            checkpoint_interval: config.checkpoint_interval.max(1),
            min_content_length: config.min_content_length,
            max_content_length: config.max_content_length,
        }
    }
}

/// Terminal outcome of one link
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    Article(ArticleRecord),
    Failed { kind: FailureKind, attempts: u32 },
    SoftReject { content_length: usize },
}

/// A worker's report for one link
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub index: usize,
    pub url: String,
    pub outcome: LinkOutcome,
}

/// What happened to a batch in this invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: u32,
    pub status: BatchStatus,
    /// Batch was already completed and was not touched
    pub skipped: bool,
    /// Terminal outcomes recorded in this invocation
    pub processed_now: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub soft_rejected: usize,
}

impl BatchReport {
    fn from_checkpoint(checkpoint: &Checkpoint, skipped: bool, processed_now: usize) -> Self {
        Self {
            batch_id: checkpoint.batch_id,
            status: checkpoint.status,
            skipped,
            processed_now,
            succeeded: checkpoint.succeeded,
            failed: checkpoint.failed_urls.len(),
            soft_rejected: checkpoint.soft_rejected.len(),
        }
    }
}

/// Aggregator state for one batch
#[derive(Debug)]
struct Progress {
    checkpoint: Checkpoint,
    articles: ArticleBatch,
    /// Completed indices at or past the watermark
    done_ahead: BTreeSet<usize>,
    since_save: usize,
    buffered: usize,
    recorded: usize,
}

impl Progress {
    fn new(checkpoint: Checkpoint, articles: ArticleBatch) -> Self {
        Self {
            checkpoint,
            articles,
            done_ahead: BTreeSet::new(),
            since_save: 0,
            buffered: 0,
            recorded: 0,
        }
    }

    fn record(&mut self, completion: Completion, stats: &mut RunStatistics) {
        let Completion {
            index,
            url,
            outcome,
        } = completion;

        match outcome {
            LinkOutcome::Article(article) => {
                self.articles.articles.push(BatchedArticle {
                    source_index: index,
                    article,
                });
                self.checkpoint.succeeded += 1;
                self.buffered += 1;
                stats.articles_extracted += 1;
            }
            LinkOutcome::Failed { kind, attempts } => {
                tracing::warn!(url = %url, attempts, "Link failed: {}", kind);
                self.checkpoint.failed_urls.push(FailedUrl {
                    url,
                    index,
                    error: kind,
                    attempts,
                });
                stats.links_failed += 1;
            }
            LinkOutcome::SoftReject { content_length } => {
                tracing::debug!(url = %url, content_length, "Content length out of bounds");
                self.checkpoint.soft_rejected.push(SoftReject {
                    url,
                    index,
                    content_length,
                });
                stats.links_soft_rejected += 1;
            }
        }

        self.checkpoint.processed_count += 1;
        self.since_save += 1;
        self.recorded += 1;

        self.done_ahead.insert(index);
        while self.done_ahead.remove(&self.checkpoint.last_processed_index) {
            self.checkpoint.last_processed_index += 1;
        }
    }

    fn should_persist(&self, settings: &ProcessorSettings) -> bool {
        self.since_save >= settings.checkpoint_interval || self.buffered >= settings.batch_size
    }
}

/// Processes sealed link batches into article batches
pub struct BatchProcessor {
    fetcher: Arc<Fetcher>,
    parser: Arc<dyn ArticleParser>,
    checkpoints: Arc<dyn CheckpointStore>,
    articles: ArticleBatchStore,
    settings: ProcessorSettings,
    stop: Arc<AtomicBool>,
}

impl BatchProcessor {
    pub fn new(
        fetcher: Arc<Fetcher>,
        parser: Arc<dyn ArticleParser>,
        checkpoints: Arc<dyn CheckpointStore>,
        articles: ArticleBatchStore,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            fetcher,
            parser,
            checkpoints,
            articles,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares a stop flag; once set, no new links are started
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Loads a checkpoint that belongs to `batch`, or starts a fresh one
    ///
    /// A checkpoint written for a different batch with the same id, or one
    /// that cannot be read, means the batch restarts from index 0.
    fn resume_point(&self, batch: &LinkBatch) -> Result<(Checkpoint, bool)> {
        match self.checkpoints.load(batch.id) {
            Ok(Some(checkpoint)) if checkpoint.matches(batch) => Ok((checkpoint, true)),
            Ok(Some(_)) => {
                tracing::warn!(
                    batch = batch.id,
                    "Checkpoint belongs to a different link batch, restarting from 0"
                );
                Ok((Checkpoint::new(batch), false))
            }
            Ok(None) => Ok((Checkpoint::new(batch), false)),
            Err(StorageError::Corrupt { batch_id, reason }) => {
                tracing::error!(
                    batch = batch_id,
                    "Checkpoint is corrupt ({}), restarting batch from 0",
                    reason
                );
                Ok((Checkpoint::new(batch), false))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, progress: &mut Progress) -> Result<()> {
        progress.articles.sort();
        self.articles.save(&progress.articles)?;
        progress.checkpoint.touch();
        self.checkpoints.save(&progress.checkpoint)?;
        progress.since_save = 0;
        progress.buffered = 0;
        tracing::debug!(
            batch = progress.checkpoint.batch_id,
            watermark = progress.checkpoint.last_processed_index,
            total = progress.checkpoint.total_links,
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Processes one batch to completion, interruption or worker failure
    ///
    /// Links `[watermark, total)` are processed; outcomes recorded earlier
    /// for those links are discarded first. A completed batch is skipped.
    pub async fn process_batch(
        &self,
        batch: &LinkBatch,
        stats: &mut RunStatistics,
    ) -> Result<BatchReport> {
        let (mut checkpoint, resumed) = self.resume_point(batch)?;

        if checkpoint.is_completed() {
            tracing::info!(batch = batch.id, "Batch already completed, skipping");
            stats.batches_skipped += 1;
            return Ok(BatchReport::from_checkpoint(&checkpoint, true, 0));
        }

        let mut articles = ArticleBatch::new(batch.id);
        if resumed {
            checkpoint.rewind_to_watermark();
            match self.articles.load(batch.id) {
                Ok(Some(existing)) => {
                    articles = existing;
                    let watermark = checkpoint.last_processed_index;
                    articles.articles.retain(|a| a.source_index < watermark);
                }
                Ok(None) if checkpoint.succeeded == 0 => {}
                Ok(None) => {
                    tracing::error!(batch = batch.id, "Article file missing, restarting batch from 0");
                    checkpoint = Checkpoint::new(batch);
                }
                Err(e) => {
                    tracing::error!(
                        batch = batch.id,
                        "Article file unreadable ({}), restarting batch from 0",
                        e
                    );
                    checkpoint = Checkpoint::new(batch);
                }
            }
        }
        checkpoint.status = BatchStatus::InProgress;

        let start = checkpoint.last_processed_index;
        tracing::info!(
            batch = batch.id,
            start,
            total = batch.len(),
            "Processing link batch"
        );

        let mut progress = Progress::new(checkpoint, articles);
        self.persist(&mut progress)?;

        let workers_ok = if start < batch.len() {
            self.run_pool(batch, start, &mut progress, stats).await?
        } else {
            true
        };

        let cp = &mut progress.checkpoint;
        cp.status = if cp.last_processed_index >= cp.total_links {
            BatchStatus::Completed
        } else if !workers_ok {
            BatchStatus::Failed
        } else {
            BatchStatus::InProgress
        };
        let status = cp.status;
        self.persist(&mut progress)?;

        match status {
            BatchStatus::Completed => {
                stats.batches_processed += 1;
                tracing::info!(
                    batch = batch.id,
                    succeeded = progress.checkpoint.succeeded,
                    failed = progress.checkpoint.failed_urls.len(),
                    soft_rejected = progress.checkpoint.soft_rejected.len(),
                    "Batch completed"
                );
            }
            BatchStatus::Failed => tracing::error!(
                batch = batch.id,
                watermark = progress.checkpoint.last_processed_index,
                "Batch failed: workers stopped early"
            ),
            _ => tracing::warn!(
                batch = batch.id,
                watermark = progress.checkpoint.last_processed_index,
                "Batch interrupted, checkpoint saved"
            ),
        }

        Ok(BatchReport::from_checkpoint(
            &progress.checkpoint,
            false,
            progress.recorded,
        ))
    }

    /// Runs the feeder, workers and aggregator; returns false if a worker died
    async fn run_pool(
        &self,
        batch: &LinkBatch,
        start: usize,
        progress: &mut Progress,
        stats: &mut RunStatistics,
    ) -> Result<bool> {
        let workers = self.settings.max_workers;
        let (job_tx, job_rx) = mpsc::channel::<(usize, LinkRecord)>(workers * 2);
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(workers * 2);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let jobs: Vec<(usize, LinkRecord)> = batch
            .links
            .iter()
            .cloned()
            .enumerate()
            .skip(start)
            .collect();
        let stop = Arc::clone(&self.stop);
        let feeder = tokio::spawn(async move {
            for job in jobs {
                if stop.load(Ordering::SeqCst) {
                    tracing::info!("Stop requested, no new links will be started");
                    break;
                }
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let done_tx = done_tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let parser = Arc::clone(&self.parser);
            let settings = self.settings;

            handles.push(tokio::spawn(async move {
                loop {
                    let job = job_rx.lock().await.recv().await;
                    let Some((index, link)) = job else {
                        break;
                    };
                    tracing::debug!(worker = worker_id, index, url = %link.url, "Processing link");
                    let outcome = process_link(&fetcher, parser.as_ref(), &link, &settings).await;
                    let completion = Completion {
                        index,
                        url: link.url,
                        outcome,
                    };
                    if done_tx.send(completion).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(done_tx);

        while let Some(completion) = done_rx.recv().await {
            progress.record(completion, stats);
            if progress.should_persist(&self.settings) {
                self.persist(progress)?;
                tracing::info!(
                    batch = batch.id,
                    done = progress.checkpoint.processed_count,
                    total = batch.len(),
                    "Batch progress"
                );
            }
        }

        let mut workers_ok = true;
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker terminated abnormally: {}", e);
                workers_ok = false;
            }
        }
        if let Err(e) = feeder.await {
            tracing::error!("Feeder terminated abnormally: {}", e);
            workers_ok = false;
        }

        Ok(workers_ok)
    }
}

/// Fetches, parses and length-checks one link
pub async fn process_link(
    fetcher: &Fetcher,
    parser: &dyn ArticleParser,
    link: &LinkRecord,
    settings: &ProcessorSettings,
) -> LinkOutcome {
    let page = match fetcher.fetch(&link.url).await {
        Ok(page) => page,
        Err(failure) => {
            return LinkOutcome::Failed {
                kind: FailureKind::from(&failure.kind),
                attempts: failure.attempts,
            }
        }
    };

    match parser.parse(&link.url, &page.body) {
        Ok(article) => check_article(article, link, settings),
        Err(e) => LinkOutcome::Failed {
            kind: FailureKind::ParseFailure {
                reason: e.reason,
                excerpt: excerpt(&page.text()),
            },
            attempts: page.attempts,
        },
    }
}

/// Applies the content length bounds and the section fallback
fn check_article(
    mut article: ArticleRecord,
    link: &LinkRecord,
    settings: &ProcessorSettings,
) -> LinkOutcome {
    let content_length = article.content_length();
    if content_length < settings.min_content_length || content_length > settings.max_content_length
    {
        return LinkOutcome::SoftReject { content_length };
    }
    if article.rubrika.trim().is_empty() {
        article.rubrika = link.category.clone();
    }
    LinkOutcome::Article(article)
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}
