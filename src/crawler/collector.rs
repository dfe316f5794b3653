//! Link collector
//!
//! Walks paginated listing pages and seals discovered article links into
//! batches. Each (category, year) pair, or (archive, year, month) when
//! archive walks are enabled, is one *walk unit* with its own page state
//! machine:
//!
//! ```text
//! Start -> FetchingPage(n) -> ExtractedLinks -> FetchingPage(n + 1)
//!                          -> Empty          -> done
//!                          -> Error          -> FetchingPage(n + 1)
//! ```
//!
//! A walk also ends when a page yields no *new* links, when `n` passes
//! `max-pages-per-category` or `max-crawl-depth`, or after
//! `max-consecutive-page-errors` failed pages in a row.

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, FetchFailure, Fetcher};
use crate::crawler::parser::{extract_listing_links, LinkFilter, ListingLink};
use crate::model::LinkRecord;
use crate::robots::RobotsPolicy;
use crate::state::RunStatistics;
use crate::storage::LinkBatchWriter;
use crate::url::{archive_listing_url, category_listing_url, normalize_url, page_url, year_from_path};
use crate::{HarvestError, Result};
use chrono::{Datelike, Utc};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Category name given to links found by month archive walks
pub const ARCHIVE_CATEGORY: &str = "Arhiva";

/// One paginated listing to walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkUnit {
    pub category: String,
    pub year: Option<i32>,
    /// First page of the listing
    pub listing: Url,
}

/// Result of fetching one listing page
#[derive(Debug)]
pub enum PageOutcome {
    ExtractedLinks(Vec<ListingLink>),
    /// No candidate links, or the page does not exist: end of the listing
    Empty,
    Error(FetchFailure),
}

/// A listing page that failed after retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPage {
    pub category: String,
    pub year: Option<i32>,
    pub page: u32,
    pub url: String,
    pub error: String,
}

/// Discovery state shared across walk units
///
/// Holds the canonical URLs seen so far (seeded from existing batches on an
/// incremental run) and the pages that failed.
#[derive(Debug, Default)]
pub struct DiscoveryState {
    seen: HashSet<String>,
    pub failed_pages: Vec<FailedPage>,
}

impl DiscoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from URLs already sealed into batches
    pub fn with_known(seen: HashSet<String>) -> Self {
        Self {
            seen,
            failed_pages: Vec::new(),
        }
    }

    /// Records a URL; returns true if it was not seen before
    pub fn insert(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    NoNewLinks,
    Empty,
    PageLimit,
    TooManyErrors,
    Disallowed,
    Stopped,
}

/// Outcome of walking one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages_fetched: u32,
    pub new_links: usize,
    pub end: WalkEnd,
}

/// Walks listings and feeds new links to a batch writer
pub struct LinkCollector {
    fetcher: Arc<Fetcher>,
    config: Arc<Config>,
    base: Url,
    filter: LinkFilter,
    selector: Selector,
    robots: RobotsPolicy,
    stop: Arc<AtomicBool>,
}

impl LinkCollector {
    pub fn new(fetcher: Arc<Fetcher>, config: Arc<Config>) -> Result<Self> {
        let base = normalize_url(&config.site.base_url)?;
        let filter = LinkFilter::from_site(&config.site)?;
        let selector = Selector::parse(&config.site.link_selector).map_err(|e| {
            crate::ConfigError::Validation(format!("invalid link_selector: {:?}", e))
        })?;
        let robots = RobotsPolicy::allow_all(&config.user_agent.crawler_name);

        Ok(Self {
            fetcher,
            config,
            base,
            filter,
            selector,
            robots,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_robots(mut self, robots: RobotsPolicy) -> Self {
        self.robots = robots;
        self
    }

    /// Shares a stop flag; once set, the current walk ends after its page
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Every walk unit for the configured categories, years and archives
    ///
    /// Month archives later than the current month are skipped.
    pub fn walk_units(&self) -> Result<Vec<WalkUnit>> {
        let site = &self.config.site;
        let crawl = &self.config.crawl;
        let mut units = Vec::new();

        let per_year = site.category_path.contains("{year}");
        for category in &site.categories {
            if per_year {
                for year in crawl.start_year..=crawl.end_year {
                    units.push(WalkUnit {
                        category: category.name.clone(),
                        year: Some(year),
                        listing: category_listing_url(
                            &self.base,
                            &site.category_path,
                            &category.slug,
                            Some(year),
                        )?,
                    });
                }
            } else {
                units.push(WalkUnit {
                    category: category.name.clone(),
                    year: None,
                    listing: category_listing_url(
                        &self.base,
                        &site.category_path,
                        &category.slug,
                        None,
                    )?,
                });
            }
        }

        if site.scrape_archive {
            let today = Utc::now().date_naive();
            for year in crawl.start_year..=crawl.end_year {
                for month in 1..=12u32 {
                    if (year, month) > (today.year(), today.month()) {
                        break;
                    }
                    units.push(WalkUnit {
                        category: ARCHIVE_CATEGORY.to_string(),
                        year: Some(year),
                        listing: archive_listing_url(&self.base, &site.archive_path, year, month)?,
                    });
                }
            }
        }

        Ok(units)
    }

    /// Fetches one listing page and classifies the result
    pub async fn fetch_page(&self, url: &Url) -> PageOutcome {
        match self.fetcher.fetch(url.as_str()).await {
            Ok(page) => {
                let links =
                    extract_listing_links(&page.text(), url, &self.selector, &self.filter);
                if links.is_empty() {
                    PageOutcome::Empty
                } else {
                    PageOutcome::ExtractedLinks(links)
                }
            }
            Err(failure) if failure.kind == FetchError::NotFound => PageOutcome::Empty,
            Err(failure) => PageOutcome::Error(failure),
        }
    }

    /// Walks one unit page by page
    pub async fn walk(
        &self,
        unit: &WalkUnit,
        state: &mut DiscoveryState,
        writer: &mut LinkBatchWriter<'_>,
        stats: &mut RunStatistics,
    ) -> Result<WalkSummary> {
        let crawl = &self.config.crawl;
        let max_page = crawl.max_pages_per_category.min(crawl.max_crawl_depth);
        let mut summary = WalkSummary {
            pages_fetched: 0,
            new_links: 0,
            end: WalkEnd::PageLimit,
        };
        let mut consecutive_errors = 0;

        for page in 1..=max_page {
            if self.stop.load(Ordering::SeqCst) {
                summary.end = WalkEnd::Stopped;
                break;
            }

            let url = page_url(&unit.listing, page);
            if !self.robots.allows(&url) {
                tracing::info!(url = %url, "Listing page disallowed by robots.txt");
                summary.end = WalkEnd::Disallowed;
                break;
            }

            match self.fetch_page(&url).await {
                PageOutcome::ExtractedLinks(links) => {
                    consecutive_errors = 0;
                    summary.pages_fetched += 1;
                    stats.listing_pages_fetched += 1;

                    let mut new_links = 0;
                    for link in links {
                        if !self.robots.allows(&link.url) {
                            continue;
                        }
                        if !state.insert(link.url.as_str()) {
                            stats.links_already_known += 1;
                            continue;
                        }
                        let year = unit.year.or_else(|| year_from_path(&link.url));
                        writer.push(LinkRecord {
                            url: link.url.to_string(),
                            category: unit.category.clone(),
                            year,
                            discovered_at_page: page,
                            title: link.title,
                        })?;
                        new_links += 1;
                    }

                    stats.links_discovered += new_links as u64;
                    summary.new_links += new_links;
                    tracing::info!(
                        category = %unit.category,
                        year = ?unit.year,
                        page,
                        new_links,
                        "Listing page processed"
                    );

                    if new_links == 0 {
                        summary.end = WalkEnd::NoNewLinks;
                        break;
                    }
                }
                PageOutcome::Empty => {
                    tracing::info!(category = %unit.category, year = ?unit.year, page, "End of listing");
                    summary.end = WalkEnd::Empty;
                    break;
                }
                PageOutcome::Error(failure) => {
                    tracing::warn!(url = %url, "Listing page failed: {}", failure);
                    stats.listing_pages_failed += 1;
                    state.failed_pages.push(FailedPage {
                        category: unit.category.clone(),
                        year: unit.year,
                        page,
                        url: url.to_string(),
                        error: failure.to_string(),
                    });

                    consecutive_errors += 1;
                    if consecutive_errors >= crawl.max_consecutive_page_errors {
                        tracing::warn!(
                            category = %unit.category,
                            year = ?unit.year,
                            "Giving up after {} consecutive page errors",
                            consecutive_errors
                        );
                        summary.end = WalkEnd::TooManyErrors;
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Walks every unit in order, feeding one shared writer
    pub async fn collect(
        &self,
        state: &mut DiscoveryState,
        writer: &mut LinkBatchWriter<'_>,
        stats: &mut RunStatistics,
    ) -> Result<Vec<(WalkUnit, WalkSummary)>> {
        let units = self.walk_units()?;
        tracing::info!("Collecting links from {} listings", units.len());

        let mut results = Vec::with_capacity(units.len());
        for unit in units {
            let summary = self.walk(&unit, state, writer, stats).await?;
            let stopped = summary.end == WalkEnd::Stopped;
            results.push((unit, summary));
            if stopped {
                tracing::warn!("Collection stopped before all listings were walked");
                return Err(HarvestError::Cancelled);
            }
        }
        Ok(results)
    }
}
