//! Crawler module for listing walks and article fetching
//!
//! This module contains the network-facing parts of the harvester:
//! - HTTP fetching with retry, exponential backoff and a global politeness gate
//! - Listing page parsing and candidate link filtering
//! - The link collector, which seals discovered links into batches
//! - The batch processor, which turns a link batch into an article batch

mod backoff;
mod collector;
mod fetcher;
mod parser;
mod politeness;
mod processor;

pub use backoff::{Backoff, RetryPolicy};
pub use collector::{
    DiscoveryState, FailedPage, LinkCollector, PageOutcome, WalkEnd, WalkSummary, WalkUnit,
    ARCHIVE_CATEGORY,
};
pub use fetcher::{build_http_client, FetchError, FetchFailure, FetchedPage, Fetcher};
pub use parser::{extract_listing_links, LinkFilter, ListingLink};
pub use politeness::PolitenessGate;
pub use processor::{
    process_link, BatchProcessor, BatchReport, Completion, LinkOutcome, ProcessorSettings,
};

pub(crate) use parser::collapse_whitespace;
