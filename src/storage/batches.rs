//! Link batch and article batch files

use crate::model::{ArticleBatch, LinkBatch, LinkRecord};
use crate::state::BatchStatus;
use crate::storage::layout::batch_file_name;
use crate::storage::traits::{StorageError, StorageResult};
use crate::storage::{read_json, write_json_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Manifest of sealed link batches (`batch_index.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIndex {
    pub batch_link_size: usize,
    pub total_links: usize,
    pub batches: Vec<BatchIndexEntry>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIndexEntry {
    pub id: u32,
    pub file: String,
    pub count: usize,
    pub status: BatchStatus,
}

impl BatchIndex {
    pub fn new(batch_link_size: usize) -> Self {
        Self {
            batch_link_size,
            total_links: 0,
            batches: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.batches.iter().map(|b| b.id).max().unwrap_or(0) + 1
    }

    pub fn entry(&self, id: u32) -> Option<&BatchIndexEntry> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn set_status(&mut self, id: u32, status: BatchStatus) {
        if let Some(entry) = self.batches.iter_mut().find(|b| b.id == id) {
            entry.status = status;
            self.updated_at = Utc::now();
        }
    }
}

/// Sealed link batches plus their manifest
#[derive(Debug, Clone)]
pub struct LinkBatchStore {
    dir: PathBuf,
}

impl LinkBatchStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("batch_index.json")
    }

    pub fn load_index(&self) -> StorageResult<Option<BatchIndex>> {
        read_json(&self.index_path())
    }

    pub fn save_index(&self, index: &BatchIndex) -> StorageResult<()> {
        write_json_atomic(&self.index_path(), index)
    }

    pub fn load_batch(&self, id: u32) -> StorageResult<LinkBatch> {
        let path = self.dir.join(batch_file_name("links", id, "json"));
        read_json(&path)?.ok_or(StorageError::MissingBatch(id))
    }

    /// Writes a sealed batch and returns its file name
    pub fn save_batch(&self, batch: &LinkBatch) -> StorageResult<String> {
        let name = batch_file_name("links", batch.id, "json");
        write_json_atomic(&self.dir.join(&name), batch)?;
        Ok(name)
    }

    /// Canonical URLs of every link in every sealed batch
    pub fn known_urls(&self) -> StorageResult<HashSet<String>> {
        let mut urls = HashSet::new();
        if let Some(index) = self.load_index()? {
            for entry in &index.batches {
                let batch = self.load_batch(entry.id)?;
                urls.extend(batch.links.into_iter().map(|l| l.url));
            }
        }
        Ok(urls)
    }

    /// Deletes every batch file and the manifest
    pub fn clear(&self) -> StorageResult<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

/// Accumulates links and seals a batch every `batch_link_size` links
///
/// New batches continue numbering after the batches already in the index,
/// so an incremental collection never rewrites a sealed batch.
pub struct LinkBatchWriter<'a> {
    store: &'a LinkBatchStore,
    index: BatchIndex,
    pending: Vec<LinkRecord>,
    sealed_this_run: Vec<u32>,
}

impl<'a> LinkBatchWriter<'a> {
    pub fn open(store: &'a LinkBatchStore, batch_link_size: usize) -> StorageResult<Self> {
        let mut index = store
            .load_index()?
            .unwrap_or_else(|| BatchIndex::new(batch_link_size));
        index.batch_link_size = batch_link_size;
        Ok(Self {
            store,
            index,
            pending: Vec::new(),
            sealed_this_run: Vec::new(),
        })
    }

    /// Adds a link, sealing a batch when the pending set is full
    pub fn push(&mut self, link: LinkRecord) -> StorageResult<Option<u32>> {
        self.pending.push(link);
        if self.pending.len() >= self.index.batch_link_size {
            return self.seal().map(Some);
        }
        Ok(None)
    }

    fn seal(&mut self) -> StorageResult<u32> {
        let batch = LinkBatch {
            id: self.index.next_id(),
            links: std::mem::take(&mut self.pending),
        };
        let file = self.store.save_batch(&batch)?;

        self.index.total_links += batch.len();
        self.index.batches.push(BatchIndexEntry {
            id: batch.id,
            file,
            count: batch.len(),
            status: BatchStatus::Pending,
        });
        self.index.updated_at = Utc::now();
        self.store.save_index(&self.index)?;
        self.sealed_this_run.push(batch.id);

        tracing::info!(batch = batch.id, links = batch.len(), "Sealed link batch");
        Ok(batch.id)
    }

    /// Seals the final partial batch (if any) and writes the manifest
    pub fn finish(mut self) -> StorageResult<(BatchIndex, Vec<u32>)> {
        if !self.pending.is_empty() {
            self.seal()?;
        } else {
            self.store.save_index(&self.index)?;
        }
        Ok((self.index, self.sealed_this_run))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Article batch files in one directory, e.g. `articles/articles_batch_0001.json`
#[derive(Debug, Clone)]
pub struct ArticleBatchStore {
    dir: PathBuf,
    prefix: &'static str,
}

impl ArticleBatchStore {
    pub fn new(dir: PathBuf, prefix: &'static str) -> Self {
        Self { dir, prefix }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, batch_id: u32) -> PathBuf {
        self.dir.join(batch_file_name(self.prefix, batch_id, "json"))
    }

    /// Path of the human-readable rendering of a batch
    pub fn text_path_for(&self, batch_id: u32) -> PathBuf {
        self.dir.join(batch_file_name(self.prefix, batch_id, "txt"))
    }

    pub fn load(&self, batch_id: u32) -> StorageResult<Option<ArticleBatch>> {
        read_json(&self.path_for(batch_id))
    }

    pub fn save(&self, batch: &ArticleBatch) -> StorageResult<()> {
        write_json_atomic(&self.path_for(batch.batch_id), batch)
    }

    /// Batch ids with a JSON file in this directory, ascending
    pub fn batch_ids(&self) -> StorageResult<Vec<u32>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}_batch_", self.prefix);
        let mut ids: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_prefix(&prefix)?
                    .strip_suffix(".json")?
                    .parse()
                    .ok()
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{article, link};
    use crate::model::BatchedArticle;
    use tempfile::tempdir;

    fn links(n: usize) -> Vec<LinkRecord> {
        (0..n).map(|i| link(&format!("https://a.hr/{}/", i))).collect()
    }

    #[test]
    fn test_writer_seals_full_and_partial_batches() {
        let dir = tempdir().unwrap();
        let store = LinkBatchStore::new(dir.path().to_path_buf());
        let mut writer = LinkBatchWriter::open(&store, 4).unwrap();

        let mut sealed = Vec::new();
        for link in links(10) {
            if let Some(id) = writer.push(link).unwrap() {
                sealed.push(id);
            }
        }
        assert_eq!(sealed, vec![1, 2]);
        assert_eq!(writer.pending_len(), 2);

        let (index, this_run) = writer.finish().unwrap();
        let counts: Vec<usize> = index.batches.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![4, 4, 2]);
        assert_eq!(this_run, vec![1, 2, 3]);
        assert_eq!(index.total_links, 10);

        assert_eq!(store.load_index().unwrap(), Some(index));
        assert_eq!(store.load_batch(3).unwrap().links.len(), 2);
        assert_eq!(store.known_urls().unwrap().len(), 10);
    }

    #[test]
    fn test_writer_continues_numbering() {
        let dir = tempdir().unwrap();
        let store = LinkBatchStore::new(dir.path().to_path_buf());

        let mut writer = LinkBatchWriter::open(&store, 3).unwrap();
        for link in links(3) {
            writer.push(link).unwrap();
        }
        writer.finish().unwrap();

        let mut writer = LinkBatchWriter::open(&store, 3).unwrap();
        writer.push(link("https://a.hr/new/")).unwrap();
        let (index, this_run) = writer.finish().unwrap();

        assert_eq!(this_run, vec![2]);
        assert_eq!(index.batches.len(), 2);
        assert_eq!(index.total_links, 4);
    }

    #[test]
    fn test_missing_batch() {
        let dir = tempdir().unwrap();
        let store = LinkBatchStore::new(dir.path().to_path_buf());
        assert!(matches!(store.load_batch(1), Err(StorageError::MissingBatch(1))));
        assert!(store.known_urls().unwrap().is_empty());
    }

    #[test]
    fn test_article_store_ids() {
        let dir = tempdir().unwrap();
        let store = ArticleBatchStore::new(dir.path().join("articles"), "articles");
        assert!(store.batch_ids().unwrap().is_empty());

        for id in [2, 1, 10] {
            let mut batch = ArticleBatch::new(id);
            batch.articles.push(BatchedArticle {
                source_index: 0,
                article: article("https://a.hr/1/", "tijelo"),
            });
            store.save(&batch).unwrap();
        }

        assert_eq!(store.batch_ids().unwrap(), vec![1, 2, 10]);
        assert_eq!(store.load(10).unwrap().unwrap().len(), 1);
        assert!(store.load(3).unwrap().is_none());
    }
}
