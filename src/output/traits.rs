//! Output error types and the packaging sink interface

use crate::storage::StorageError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to package output: {0}")]
    Package(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Files produced by the combine stage
#[derive(Debug, Clone, Copy)]
pub struct FinalArtifacts<'a> {
    pub corpus: &'a Path,
    pub report_json: &'a Path,
    pub report_markdown: &'a Path,
}

impl<'a> FinalArtifacts<'a> {
    pub fn paths(&self) -> [&'a Path; 3] {
        [self.corpus, self.report_json, self.report_markdown]
    }
}

/// Packages the final artifacts for delivery
///
/// Archive formats (ZIP and the like) are left to implementations; the
/// pipeline only needs to know where the package ended up.
pub trait CorpusSink {
    fn package(&self, artifacts: &FinalArtifacts<'_>) -> OutputResult<PathBuf>;
}
