use serde::Deserialize;

/// Main configuration structure for a harvesting run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The news site being harvested and how its listings are shaped
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root of the site, e.g. `https://poskok.info`
    #[serde(rename = "base-url", alias = "baseUrl")]
    pub base_url: String,

    /// Publication name written into every corpus record
    #[serde(rename = "source-name", alias = "sourceName")]
    pub source_name: String,

    /// Category listing path; `{slug}` is required, `{year}` optional
    #[serde(
        rename = "category-path",
        alias = "categoryPath",
        default = "default_category_path"
    )]
    pub category_path: String,

    /// Month archive path with `{year}` and `{month}` placeholders
    #[serde(
        rename = "archive-path",
        alias = "archivePath",
        default = "default_archive_path"
    )]
    pub archive_path: String,

    /// Also walk the month archives for every year in range
    #[serde(rename = "scrape-archive", alias = "scrapeArchive", default)]
    pub scrape_archive: bool,

    /// CSS selector for candidate article anchors on listing pages
    #[serde(
        rename = "link-selector",
        alias = "linkSelector",
        default = "default_link_selector"
    )]
    pub link_selector: String,

    /// Substrings that disqualify a discovered URL
    #[serde(
        rename = "exclude-patterns",
        alias = "excludePatterns",
        default = "default_exclude_patterns"
    )]
    pub exclude_patterns: Vec<String>,

    /// Terms that disqualify a link when found in its URL or anchor text
    #[serde(rename = "blocked-terms", alias = "blockedTerms", default)]
    pub blocked_terms: Vec<String>,

    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

/// A site section: display name plus the slug used in listing URLs
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub slug: String,
}

/// Link discovery limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    #[serde(rename = "start-year", alias = "startYear", default = "default_start_year")]
    pub start_year: i32,

    #[serde(rename = "end-year", alias = "endYear", default = "default_end_year")]
    pub end_year: i32,

    /// Upper bound on listing pages walked per (category, year)
    #[serde(
        rename = "max-pages-per-category",
        alias = "maxPagesPerCategory",
        default = "default_max_pages"
    )]
    pub max_pages_per_category: u32,

    /// Global pagination depth limit
    #[serde(
        rename = "max-crawl-depth",
        alias = "maxCrawlDepth",
        default = "default_max_pages"
    )]
    pub max_crawl_depth: u32,

    /// Links per sealed batch file
    #[serde(
        rename = "batch-link-size",
        alias = "batchLinkSize",
        default = "default_batch_link_size"
    )]
    pub batch_link_size: usize,

    /// Discard existing link batches and collect from scratch
    #[serde(rename = "force-refresh-links", alias = "forceRefreshLinks", default)]
    pub force_refresh_links: bool,

    #[serde(
        rename = "respect-robots-txt",
        alias = "respectRobotsTxt",
        default = "default_true"
    )]
    pub respect_robots_txt: bool,

    /// A walk gives up after this many failed pages in a row
    #[serde(
        rename = "max-consecutive-page-errors",
        alias = "maxConsecutivePageErrors",
        default = "default_max_consecutive_page_errors"
    )]
    pub max_consecutive_page_errors: u32,
}

/// HTTP fetch behaviour: timeouts, retry budget, politeness
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Total attempts per URL, first try included
    #[serde(rename = "max-retries", alias = "maxRetries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base delay (seconds)
    #[serde(rename = "retry-delay", alias = "retryDelay", default = "default_retry_delay")]
    pub retry_delay: f64,

    #[serde(
        rename = "backoff-factor",
        alias = "backoffFactor",
        default = "default_backoff_factor"
    )]
    pub backoff_factor: f64,

    /// Upper bound on a single backoff sleep (seconds)
    #[serde(rename = "max-backoff", alias = "maxBackoff", default = "default_max_backoff")]
    pub max_backoff: f64,

    /// Minimum spacing between any two requests (seconds)
    #[serde(
        rename = "crawl-delay-min",
        alias = "crawlDelayMin",
        default = "default_crawl_delay_min"
    )]
    pub crawl_delay_min: f64,

    /// Maximum spacing between any two requests (seconds)
    #[serde(
        rename = "crawl-delay-max",
        alias = "crawlDelayMax",
        default = "default_crawl_delay_max"
    )]
    pub crawl_delay_max: f64,
}

/// Where checkpoints are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// One JSON file per batch, replaced atomically
    #[default]
    File,
    /// A single SQLite database holding every checkpoint
    Sqlite,
}

/// Batch processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    #[serde(rename = "max-workers", alias = "maxWorkers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Successful articles buffered before the article file is rewritten
    #[serde(rename = "batch-size", alias = "batchSize", default = "default_batch_size")]
    pub batch_size: usize,

    /// Completions between checkpoint writes
    #[serde(
        rename = "checkpoint-interval",
        alias = "checkpointInterval",
        default = "default_checkpoint_interval"
    )]
    pub checkpoint_interval: usize,

    /// Body length bounds in characters; outside them an article is soft-rejected
    #[serde(
        rename = "min-content-length",
        alias = "minContentLength",
        default = "default_min_content_length"
    )]
    pub min_content_length: usize,

    #[serde(
        rename = "max-content-length",
        alias = "maxContentLength",
        default = "default_max_content_length"
    )]
    pub max_content_length: usize,

    #[serde(rename = "checkpoint-backend", alias = "checkpointBackend", default)]
    pub checkpoint_backend: CheckpointBackend,
}

/// Language filter policy
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
    /// Foreign token fraction above which an article is foreign
    #[serde(
        rename = "foreign-threshold",
        alias = "foreignThreshold",
        default = "default_foreign_threshold"
    )]
    pub foreign_threshold: f64,

    #[serde(
        rename = "accept-mixed-content",
        alias = "acceptMixedContent",
        default = "default_true"
    )]
    pub accept_mixed_content: bool,

    /// Local token fraction an over-threshold article needs to count as mixed
    #[serde(
        rename = "mixed-content-floor",
        alias = "mixedContentFloor",
        default = "default_mixed_content_floor"
    )]
    pub mixed_content_floor: f64,

    /// Replaces the built-in foreign lexicon
    #[serde(rename = "foreign-words", alias = "foreignWords", default)]
    pub foreign_words: Option<Vec<String>>,

    /// Replaces the built-in local lexicon
    #[serde(rename = "local-words", alias = "localWords", default)]
    pub local_words: Option<Vec<String>>,

    /// Characters that mark a token as local on their own
    #[serde(
        rename = "local-markers",
        alias = "localMarkers",
        default = "default_local_markers"
    )]
    pub local_markers: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for every intermediate and final artifact
    #[serde(rename = "data-dir", alias = "outputFolder", default = "default_data_dir")]
    pub data_dir: String,

    /// File name of the combined corpus
    #[serde(rename = "corpus-file", alias = "corpusFile", default = "default_corpus_file")]
    pub corpus_file: String,

    /// Copy the corpus and reports into an archive directory when combining
    #[serde(default = "default_true")]
    pub archive: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            end_year: default_end_year(),
            max_pages_per_category: default_max_pages(),
            max_crawl_depth: default_max_pages(),
            batch_link_size: default_batch_link_size(),
            force_refresh_links: false,
            respect_robots_txt: true,
            max_consecutive_page_errors: default_max_consecutive_page_errors(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            backoff_factor: default_backoff_factor(),
            max_backoff: default_max_backoff(),
            crawl_delay_min: default_crawl_delay_min(),
            crawl_delay_max: default_crawl_delay_max(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            batch_size: default_batch_size(),
            checkpoint_interval: default_checkpoint_interval(),
            min_content_length: default_min_content_length(),
            max_content_length: default_max_content_length(),
            checkpoint_backend: CheckpointBackend::default(),
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            foreign_threshold: default_foreign_threshold(),
            accept_mixed_content: true,
            mixed_content_floor: default_mixed_content_floor(),
            foreign_words: None,
            local_words: None,
            local_markers: default_local_markers(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            corpus_file: default_corpus_file(),
            archive: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_category_path() -> String {
    "/category/{slug}/".to_string()
}

fn default_archive_path() -> String {
    "/{year}/{month}/".to_string()
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "/category/",
        "/tag/",
        "/author/",
        "/page/",
        "/feed/",
        "/wp-",
        "/search/",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_start_year() -> i32 {
    2012
}

fn default_end_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}

fn default_max_pages() -> u32 {
    300
}

fn default_batch_link_size() -> usize {
    1000
}

fn default_max_consecutive_page_errors() -> u32 {
    3
}

fn default_timeout() -> f64 {
    45.0
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> f64 {
    5.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_backoff() -> f64 {
    120.0
}

fn default_crawl_delay_min() -> f64 {
    1.0
}

fn default_crawl_delay_max() -> f64 {
    3.0
}

fn default_max_workers() -> usize {
    4
}

fn default_batch_size() -> usize {
    100
}

fn default_checkpoint_interval() -> usize {
    20
}

fn default_min_content_length() -> usize {
    200
}

fn default_max_content_length() -> usize {
    100_000
}

fn default_foreign_threshold() -> f64 {
    0.15
}

fn default_mixed_content_floor() -> f64 {
    0.05
}

fn default_local_markers() -> String {
    "čćžšđ".to_string()
}

fn default_data_dir() -> String {
    "PoskokData".to_string()
}

fn default_corpus_file() -> String {
    "SviClanci.txt".to_string()
}
