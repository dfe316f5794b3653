//! Stage runners
//!
//! Each stage reads only the durable output of the stage before it:
//!
//! ```text
//! collect  -> links/            (sealed link batches + batch_index.json)
//! process  -> articles/         (+ one checkpoint per batch)
//! filter   -> filtered/local/, filtered/foreign/, filter_summary.json
//! combine  -> final/<corpus-file>, final/report.json, final/report.md
//! ```
//!
//! so any stage can be re-run on its own, and an interrupted run picks up
//! where it stopped.

use crate::config::Config;
use crate::crawler::{
    BatchProcessor, BatchReport, DiscoveryState, FailedPage, Fetcher, LinkCollector,
    ProcessorSettings,
};
use crate::extract::HtmlArticleParser;
use crate::language::{Language, LanguagePolicy};
use crate::model::ArticleBatch;
use crate::output::{
    combine, format_records, write_markdown_report, CombineStats, Corpus, CorpusSink,
    DirectorySink, FilterSummary, FinalArtifacts, RunReport,
};
use crate::robots::fetch_robots;
use crate::state::{BatchStatus, RunStatistics};
use crate::storage::{
    open_checkpoint_store, read_json, write_atomic, write_json_atomic, ArticleBatchStore,
    BatchIndex, CheckpointStore, DataLayout, LinkBatchStore, LinkBatchWriter, StorageError,
};
use crate::{HarvestError, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Batch ids picked on the command line
pub type BatchSelection = BTreeSet<u32>;

/// Widest range `parse_batch_range` accepts in one piece
pub const MAX_RANGE_SPAN: u32 = 100_000;

/// Parses `1-5`, `7,9,12` or a mix such as `1-3,7`
///
/// # Examples
///
/// ```
/// use novina::pipeline::parse_batch_range;
///
/// let ids = parse_batch_range("1-3,7").unwrap();
/// assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 7]);
/// ```
pub fn parse_batch_range(spec: &str) -> Result<BatchSelection> {
    let invalid = |msg: String| HarvestError::BatchSelection(msg);
    let parse_id = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| invalid(format!("'{}' is not a batch number", s.trim())))
    };

    let mut ids = BatchSelection::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse_id(start)?, parse_id(end)?);
                if start > end {
                    return Err(invalid(format!("range {} is reversed", part)));
                }
                if end - start >= MAX_RANGE_SPAN {
                    return Err(invalid(format!(
                        "range {} spans more than {} batches",
                        part, MAX_RANGE_SPAN
                    )));
                }
                ids.extend(start..=end);
            }
            None => {
                ids.insert(parse_id(part)?);
            }
        }
    }

    if ids.is_empty() {
        return Err(invalid("no batches selected".to_string()));
    }
    Ok(ids)
}

/// Result of the collect stage
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    pub index: BatchIndex,
    pub sealed: Vec<u32>,
    pub new_links: usize,
    pub failed_pages: usize,
}

/// One line of `status` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatusLine {
    pub id: u32,
    pub links: usize,
    pub status: BatchStatus,
    pub watermark: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub soft_rejected: usize,
}

/// Runs pipeline stages against one data directory
pub struct Pipeline {
    config: Arc<Config>,
    config_hash: String,
    layout: DataLayout,
    fetcher: Arc<Fetcher>,
    stop: Arc<AtomicBool>,
    stats: RunStatistics,
}

impl Pipeline {
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(&config)?);
        Ok(Self {
            layout: DataLayout::new(&config.output.data_dir),
            config: Arc::new(config),
            config_hash: config_hash.into(),
            fetcher,
            stop: Arc::new(AtomicBool::new(false)),
            stats: RunStatistics::default(),
        })
    }

    /// Replaces the fetcher (tests use an unthrottled one)
    pub fn with_fetcher(mut self, fetcher: Arc<Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Shares a stop flag with the caller, typically set from a Ctrl-C handler
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    fn link_store(&self) -> LinkBatchStore {
        LinkBatchStore::new(self.layout.links_dir())
    }

    fn checkpoint_store(&self) -> Result<Arc<dyn CheckpointStore>> {
        Ok(open_checkpoint_store(
            self.config.processing.checkpoint_backend,
            &self.layout,
        )?)
    }

    fn article_store(&self) -> ArticleBatchStore {
        ArticleBatchStore::new(self.layout.articles_dir(), "articles")
    }

    fn local_store(&self) -> ArticleBatchStore {
        ArticleBatchStore::new(self.layout.local_dir(), "local")
    }

    fn foreign_store(&self) -> ArticleBatchStore {
        ArticleBatchStore::new(self.layout.foreign_dir(), "foreign")
    }

    fn load_index(&self) -> Result<Option<BatchIndex>> {
        let index = self.link_store().load_index()?;
        if index.is_none() {
            tracing::warn!(
                "No link batches in {}, run the collect stage first",
                self.layout.links_dir().display()
            );
        }
        Ok(index)
    }

    /// Discards every link batch and everything derived from it
    fn reset(&self) -> Result<()> {
        tracing::info!("Discarding existing link batches and derived output");
        self.link_store().clear()?;
        self.checkpoint_store()?.clear()?;
        for dir in [self.layout.articles_dir(), self.layout.filtered_dir()] {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Collect stage: walks listings and seals new links into batches
    ///
    /// Without `fresh` (or `force-refresh-links`), links already in a
    /// sealed batch are skipped and numbering continues after the last
    /// batch.
    pub async fn collect(&mut self, fresh: bool) -> Result<CollectOutcome> {
        let fresh = fresh || self.config.crawl.force_refresh_links;
        if fresh {
            self.reset()?;
        }

        let store = self.link_store();
        let mut state = if fresh {
            DiscoveryState::new()
        } else {
            let known = store.known_urls()?;
            tracing::info!("{} links already collected", known.len());
            DiscoveryState::with_known(known)
        };

        let mut collector = LinkCollector::new(Arc::clone(&self.fetcher), Arc::clone(&self.config))?
            .with_stop_flag(Arc::clone(&self.stop));
        if self.config.crawl.respect_robots_txt {
            let robots = fetch_robots(
                &self.fetcher,
                collector.base(),
                &self.config.user_agent.crawler_name,
            )
            .await;
            if let Some(delay) = robots.crawl_delay() {
                self.fetcher.gate().raise_floor(delay).await;
            }
            collector = collector.with_robots(robots);
        }

        let mut writer = LinkBatchWriter::open(&store, self.config.crawl.batch_link_size)?;
        let result = collector
            .collect(&mut state, &mut writer, &mut self.stats)
            .await;
        let (index, sealed) = writer.finish()?;
        self.stats.batches_sealed += sealed.len() as u64;

        write_json_atomic(&self.layout.failed_pages_path(), &state.failed_pages)?;

        let walks = result?;
        let new_links = walks.iter().map(|(_, summary)| summary.new_links).sum();
        tracing::info!(
            walks = walks.len(),
            new_links,
            sealed = sealed.len(),
            total_batches = index.batches.len(),
            "Link collection finished"
        );

        Ok(CollectOutcome {
            index,
            sealed,
            new_links,
            failed_pages: state.failed_pages.len(),
        })
    }

    /// Process stage: runs the batch processor over pending batches
    pub async fn process(&mut self, selection: Option<&BatchSelection>) -> Result<Vec<BatchReport>> {
        let Some(mut index) = self.load_index()? else {
            return Ok(Vec::new());
        };
        let store = self.link_store();

        let ids: Vec<u32> = index
            .batches
            .iter()
            .map(|entry| entry.id)
            .filter(|id| selection.map_or(true, |s| s.contains(id)))
            .collect();
        if let Some(selection) = selection {
            for missing in selection.iter().filter(|id| index.entry(**id).is_none()) {
                tracing::warn!(batch = missing, "Selected batch does not exist");
            }
        }

        let parser = Arc::new(HtmlArticleParser::new(self.config.site.source_name.clone()));
        let processor = BatchProcessor::new(
            Arc::clone(&self.fetcher),
            parser,
            self.checkpoint_store()?,
            self.article_store(),
            ProcessorSettings::from(&self.config.processing),
        )
        .with_stop_flag(Arc::clone(&self.stop));

        let mut reports = Vec::with_capacity(ids.len());
        for id in ids {
            if self.stop.load(Ordering::SeqCst) {
                return Err(HarvestError::Cancelled);
            }

            let batch = match store.load_batch(id) {
                Ok(batch) => batch,
                Err(e @ StorageError::MissingBatch(_)) | Err(e @ StorageError::Json(_)) => {
                    tracing::error!(batch = id, "Cannot load link batch: {}", e);
                    index.set_status(id, BatchStatus::Failed);
                    store.save_index(&index)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let report = processor.process_batch(&batch, &mut self.stats).await?;
            index.set_status(id, report.status);
            store.save_index(&index)?;

            let interrupted = report.status == BatchStatus::InProgress;
            reports.push(report);
            if interrupted && self.stop.load(Ordering::SeqCst) {
                return Err(HarvestError::Cancelled);
            }
        }

        Ok(reports)
    }

    /// Filter stage: splits completed article batches into local and foreign
    pub fn filter(&mut self) -> Result<FilterSummary> {
        let Some(index) = self.load_index()? else {
            return Ok(FilterSummary::default());
        };
        let policy = LanguagePolicy::from_config(&self.config.language);
        let checkpoints = self.checkpoint_store()?;
        let articles = self.article_store();
        let local_store = self.local_store();
        let foreign_store = self.foreign_store();
        let source = &self.config.site.source_name;

        let mut summary = FilterSummary::default();
        for entry in &index.batches {
            let completed = match checkpoints.load(entry.id) {
                Ok(Some(cp)) => cp.is_completed(),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(batch = entry.id, "Skipping batch: {}", e);
                    false
                }
            };
            if !completed {
                tracing::info!(batch = entry.id, "Batch not completed, not filtering");
                continue;
            }
            let Some(batch) = articles.load(entry.id)? else {
                tracing::warn!(batch = entry.id, "Completed batch has no article file");
                continue;
            };

            let mut local = ArticleBatch::new(batch.batch_id);
            let mut foreign = ArticleBatch::new(batch.batch_id);
            for item in batch.articles {
                summary.articles_in += 1;
                let verdict = policy.classify(&item.article);
                tracing::debug!(
                    url = %item.article.url,
                    language = ?verdict.language,
                    foreign_fraction = verdict.foreign_fraction,
                    "Classified article"
                );
                match verdict.language {
                    Language::Local => {
                        if verdict.mixed {
                            summary.mixed += 1;
                        }
                        local.articles.push(item);
                    }
                    Language::Foreign => {
                        summary.foreign_urls.push(item.article.url.clone());
                        foreign.articles.push(item);
                    }
                }
            }

            summary.local += local.len();
            summary.foreign += foreign.len();
            summary.batches.push(entry.id);

            for (store, filtered) in [(&local_store, &local), (&foreign_store, &foreign)] {
                store.save(filtered)?;
                let text = format_records(filtered.articles.iter().map(|a| &a.article), source);
                write_atomic(&store.text_path_for(filtered.batch_id), text.as_bytes())?;
            }
            tracing::info!(
                batch = entry.id,
                local = local.len(),
                foreign = foreign.len(),
                "Batch filtered"
            );
        }

        summary.updated_at = Some(Utc::now());
        write_json_atomic(&self.layout.filter_summary_path(), &summary)?;

        self.stats.articles_local += summary.local as u64;
        self.stats.articles_foreign += summary.foreign as u64;
        self.stats.articles_mixed += summary.mixed as u64;
        Ok(summary)
    }

    /// Combine stage: deduplicates local batches into the final corpus and
    /// writes the report
    pub fn combine(&mut self) -> Result<RunReport> {
        let links_collected = self
            .link_store()
            .load_index()?
            .map_or(0, |index| index.total_links);

        let filter: FilterSummary = match read_json(&self.layout.filter_summary_path())? {
            Some(summary) => summary,
            None => {
                tracing::warn!("No filter summary found, run the filter stage first");
                FilterSummary::default()
            }
        };

        let local_store = self.local_store();
        let mut batches = Vec::with_capacity(filter.batches.len());
        for id in &filter.batches {
            match local_store.load(*id)? {
                Some(batch) => batches.push(batch),
                None => tracing::warn!(batch = id, "Filtered batch missing"),
            }
        }

        let (corpus, combine_stats) = combine(batches, &self.config.site.source_name);

        let final_dir = self.layout.final_dir();
        let corpus_path = final_dir.join(&self.config.output.corpus_file);
        write_atomic(&corpus_path, corpus.text.as_bytes())?;

        let report = self.write_report(links_collected, &filter, &corpus, &combine_stats)?;

        if self.config.output.archive {
            DirectorySink::new(self.layout.archive_dir()).package(&FinalArtifacts {
                corpus: &corpus_path,
                report_json: &self.layout.report_json_path(),
                report_markdown: &self.layout.report_markdown_path(),
            })?;
        }

        self.stats.duplicates_removed += combine_stats.duplicates_removed as u64;
        self.stats.final_articles += corpus.records as u64;
        tracing::info!(
            articles = corpus.records,
            duplicates = combine_stats.duplicates_removed,
            bytes = corpus.size_bytes(),
            "Corpus written to {}",
            corpus_path.display()
        );
        Ok(report)
    }

    /// Builds the run report from checkpoints and writes both report files
    fn write_report(
        &self,
        links_collected: usize,
        filter: &FilterSummary,
        corpus: &Corpus,
        combine_stats: &CombineStats,
    ) -> Result<RunReport> {
        let checkpoints = self.checkpoint_store()?.list()?;
        let failed_pages: Vec<FailedPage> =
            read_json(&self.layout.failed_pages_path())?.unwrap_or_default();
        let report = RunReport::build(
            &self.config.site.source_name,
            &self.config_hash,
            links_collected,
            &checkpoints,
            filter,
            (corpus, combine_stats),
            failed_pages,
        );

        report.write_json(&self.layout.report_json_path())?;
        write_markdown_report(&report, &self.layout.report_markdown_path())?;
        Ok(report)
    }

    /// Writes a report covering whatever the checkpoints hold so far, with
    /// an empty corpus
    pub fn write_partial_report(&self) -> Result<RunReport> {
        let links_collected = self
            .link_store()
            .load_index()?
            .map_or(0, |index| index.total_links);
        let filter: FilterSummary =
            read_json(&self.layout.filter_summary_path())?.unwrap_or_default();
        let report = self.write_report(
            links_collected,
            &filter,
            &Corpus::default(),
            &CombineStats::default(),
        )?;
        tracing::info!(
            "Partial report written to {}",
            self.layout.report_json_path().display()
        );
        Ok(report)
    }

    /// Runs every stage in order
    ///
    /// When collection or processing stops early the report is still written
    /// from the checkpoints before the error is returned.
    pub async fn run(&mut self, fresh: bool) -> Result<RunReport> {
        let staged = match self.collect(fresh).await {
            Ok(_) => self.process(None).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            tracing::warn!("Run stopped early: {}", e);
            if let Err(report_err) = self.write_partial_report() {
                tracing::error!("Failed to write partial report: {}", report_err);
            }
            return Err(e);
        }

        self.filter()?;
        self.combine()
    }

    /// Per-batch progress from the batch index and checkpoints
    pub fn status(&self) -> Result<Vec<BatchStatusLine>> {
        let Some(index) = self.link_store().load_index()? else {
            return Ok(Vec::new());
        };
        let checkpoints = self.checkpoint_store()?;

        let mut lines = Vec::with_capacity(index.batches.len());
        for entry in &index.batches {
            let line = match checkpoints.load(entry.id) {
                Ok(Some(cp)) => BatchStatusLine {
                    id: entry.id,
                    links: entry.count,
                    status: cp.status,
                    watermark: cp.last_processed_index,
                    succeeded: cp.succeeded,
                    failed: cp.failed_urls.len(),
                    soft_rejected: cp.soft_rejected.len(),
                },
                Ok(None) | Err(StorageError::Corrupt { .. }) => BatchStatusLine {
                    id: entry.id,
                    links: entry.count,
                    status: entry.status,
                    watermark: 0,
                    succeeded: 0,
                    failed: 0,
                    soft_rejected: 0,
                },
                Err(e) => return Err(e.into()),
            };
            lines.push(line);
        }
        Ok(lines)
    }
}
