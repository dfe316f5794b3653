use std::path::{Path, PathBuf};

/// Directory layout under the configured data directory
///
/// ```text
/// <data-dir>/
///   links/batch_index.json, links/links_batch_0001.json, links/failed_pages.json
///   checkpoints/checkpoint_batch_0001.json, ...  (file backend)
///   harvest.db                            (sqlite backend)
///   articles/articles_batch_0001.json, ...
///   filtered/local/, filtered/foreign/, filtered/filter_summary.json
///   final/<corpus-file>, final/report.json, final/report.md, final/archive/
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn links_dir(&self) -> PathBuf {
        self.root.join("links")
    }

    /// Listing pages that failed during the last collection
    pub fn failed_pages_path(&self) -> PathBuf {
        self.links_dir().join("failed_pages.json")
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.root.join("checkpoints")
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join("harvest.db")
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.root.join("articles")
    }

    pub fn filtered_dir(&self) -> PathBuf {
        self.root.join("filtered")
    }

    pub fn local_dir(&self) -> PathBuf {
        self.filtered_dir().join("local")
    }

    pub fn foreign_dir(&self) -> PathBuf {
        self.filtered_dir().join("foreign")
    }

    pub fn filter_summary_path(&self) -> PathBuf {
        self.filtered_dir().join("filter_summary.json")
    }

    pub fn final_dir(&self) -> PathBuf {
        self.root.join("final")
    }

    pub fn report_json_path(&self) -> PathBuf {
        self.final_dir().join("report.json")
    }

    pub fn report_markdown_path(&self) -> PathBuf {
        self.final_dir().join("report.md")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.final_dir().join("archive")
    }
}

/// `links_batch_0007.json` style file name for a batch id
pub(crate) fn batch_file_name(prefix: &str, batch_id: u32, extension: &str) -> String {
    format!("{}_batch_{:04}.{}", prefix, batch_id, extension)
}
