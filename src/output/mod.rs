//! Output module for the final corpus and run reports
//!
//! This module handles:
//! - Rendering articles as fixed-format corpus records
//! - Content fingerprints and the deduplicating combiner
//! - The JSON run report and its markdown rendering
//! - Packaging the final artifacts through a [`CorpusSink`]

mod combiner;
mod fingerprint;
mod markdown;
mod record;
mod report;
mod sink;
mod traits;

pub use combiner::{combine, CombineStats, Combiner, Corpus, DuplicateEntry};
pub use fingerprint::fingerprint;
pub use markdown::{format_markdown_report, write_markdown_report};
pub use record::{format_record, format_records, header_value, tidy_body, FIELD_LABELS, RECORD_SEPARATOR};
pub use report::{BatchSummary, FailureEntry, FilterSummary, RunReport};
pub use sink::DirectorySink;
pub use traits::{CorpusSink, FinalArtifacts, OutputError, OutputResult};
