//! Core DocStore implementation

use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::embed::{Embedder, TokenHashEmbedder, cosine_distance};

/// Unique identifier for a stored document
pub type DocId = String;

/// Name of the append-only index file inside the store directory
pub const INDEX_FILE: &str = "index.jsonl";

/// One persisted record (one line of `index.jsonl`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Unique document ID
    pub id: DocId,
    /// Document text
    pub text: String,
    /// Free-form metadata; `source` is used for citation
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
}

/// A document to be added with a freshly minted ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl NewDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A query hit, nearest first
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub id: DocId,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    /// Cosine distance to the query (smaller is more relevant)
    pub distance: f32,
}

/// Statistics for the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of live documents
    pub document_count: usize,
    /// Number of distinct `source` metadata values
    pub source_count: usize,
    /// Total text bytes
    pub total_bytes: u64,
}

/// Semantic document index consumed by retrieval
pub trait DocumentIndex: Send + Sync {
    /// Insert or replace the document with the given ID
    fn upsert(&self, id: &str, text: &str, metadata: BTreeMap<String, String>) -> Result<()>;

    /// Up to `top_k` documents ordered by increasing distance to `text`
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredDocument>>;

    /// Number of documents in the index
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add documents, minting a fresh ID for each one
    ///
    /// Re-adding identical text creates a duplicate entry. An empty slice is a no-op.
    fn add_documents(&self, docs: &[NewDocument]) -> Result<Vec<DocId>> {
        debug!(count = docs.len(), "DocumentIndex::add_documents: called");
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = Uuid::now_v7().to_string();
            self.upsert(&id, &doc.text, doc.metadata.clone())?;
            ids.push(id);
        }
        Ok(ids)
    }
}

struct Entry {
    doc: StoredDocument,
    vector: Vec<f32>,
}

/// In-memory view of the index: entries in insertion order plus an ID lookup
#[derive(Default)]
struct Entries {
    items: Vec<Entry>,
    positions: HashMap<DocId, usize>,
}

impl Entries {
    fn insert(&mut self, entry: Entry) {
        match self.positions.get(&entry.doc.id) {
            Some(&pos) => self.items[pos] = entry,
            None => {
                self.positions.insert(entry.doc.id.clone(), self.items.len());
                self.items.push(entry);
            }
        }
    }
}

/// Append-only, file-backed document index
pub struct DocStore {
    /// Base path for storage
    base_path: PathBuf,
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Entries>,
}

impl DocStore {
    /// Open or create a store at the given path with the default embedder
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_embedder(path, Arc::new(TokenHashEmbedder::default()))
    }

    /// Open or create a store at the given path
    ///
    /// Replays `index.jsonl`; a later record with the same ID replaces an earlier one.
    pub fn open_with_embedder(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let mut entries = Entries::default();
        let index_path = base_path.join(INDEX_FILE);
        if index_path.exists() {
            let file = fs::File::open(&index_path).context("Failed to open index file")?;
            let reader = BufReader::new(file);

            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let doc: StoredDocument = match serde_json::from_str(&line) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!(line = lineno + 1, error = %e, "Skipping malformed index record");
                        continue;
                    }
                };
                let vector = embedder.embed(&doc.text);
                entries.insert(Entry { doc, vector });
            }
        }

        debug!(?base_path, document_count = entries.items.len(), "Opened document store");
        Ok(Self {
            base_path,
            embedder,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the store directory
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// First `limit` documents in insertion order
    pub fn peek(&self, limit: usize) -> Vec<StoredDocument> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.items.iter().take(limit).map(|e| e.doc.clone()).collect()
    }

    /// Get statistics for the store
    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut sources = HashSet::new();
        let mut total_bytes = 0u64;

        for e in entries.items.iter() {
            total_bytes += e.doc.text.len() as u64;
            if let Some(source) = e.doc.metadata.get("source") {
                sources.insert(source.clone());
            }
        }

        StoreStats {
            document_count: entries.items.len(),
            source_count: sources.len(),
            total_bytes,
        }
    }

    fn append_record(&self, doc: &StoredDocument) -> Result<()> {
        let index_path = self.base_path.join(INDEX_FILE);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&index_path)
            .context(format!("Failed to open {}", index_path.display()))?;

        file.lock_exclusive().context("Failed to lock index file")?;
        let line = serde_json::to_string(doc)?;
        let written = writeln!(file, "{}", line).and_then(|_| file.flush());
        FileExt::unlock(&file).context("Failed to unlock index file")?;
        written.context("Failed to append index record")?;
        Ok(())
    }
}

impl DocumentIndex for DocStore {
    fn upsert(&self, id: &str, text: &str, metadata: BTreeMap<String, String>) -> Result<()> {
        debug!(%id, text_len = text.len(), "DocStore::upsert: called");
        let doc = StoredDocument {
            id: id.to_string(),
            text: text.to_string(),
            metadata,
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        let vector = self.embedder.embed(&doc.text);

        // Append under the write lock: memory never runs ahead of the file.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.append_record(&doc)?;
        entries.insert(Entry { doc, vector });
        Ok(())
    }

    fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        debug!(query_len = text.len(), top_k, "DocStore::query: called");
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let q = self.embedder.embed(text);
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());

        let mut scored: Vec<(f32, &Entry)> = entries
            .items
            .iter()
            .map(|e| (cosine_distance(&q, &e.vector), e))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let hits: Vec<ScoredDocument> = scored
            .into_iter()
            .take(top_k)
            .map(|(distance, e)| ScoredDocument {
                id: e.doc.id.clone(),
                text: e.doc.text.clone(),
                metadata: e.doc.metadata.clone(),
                distance,
            })
            .collect();

        debug!(hits = hits.len(), "DocStore::query: complete");
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_docs() -> Vec<NewDocument> {
        vec![
            NewDocument::new("Tomato seedlings need 14-16 hours of light per day for optimal growth.")
                .with_meta("source", "fao.org")
                .with_meta("topic", "light"),
            NewDocument::new("The ideal temperature for tomato germination is 20-25 degrees Celsius.")
                .with_meta("source", "usda.gov")
                .with_meta("topic", "temperature"),
            NewDocument::new("Wheat requires less water than rice during the vegetative stage.")
                .with_meta("source", "icar.org.in")
                .with_meta("topic", "water"),
        ]
    }

    #[test]
    fn test_add_and_query() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        store.add_documents(&sample_docs()).unwrap();

        let hits = store.query("light hours for tomato seedlings", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].text.contains("14-16 hours"));
        assert_eq!(hits[0].metadata.get("source").map(String::as_str), Some("fao.org"));

        let hits = store.query("germination temperature", 1).unwrap();
        assert!(hits[0].text.contains("20-25 degrees"));
    }

    #[test]
    fn test_query_orders_by_increasing_distance() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        store.add_documents(&sample_docs()).unwrap();

        let hits = store.query("tomato light", 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_top_k_larger_than_store() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        store.add_documents(&sample_docs()[..1]).unwrap();

        let hits = store.query("anything", 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_top_k_zero_and_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        assert!(store.query("tomato", 3).unwrap().is_empty());

        store.add_documents(&sample_docs()).unwrap();
        assert!(store.query("tomato", 0).unwrap().is_empty());
    }

    #[test]
    fn test_add_empty_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        let ids = store.add_documents(&[]).unwrap();
        assert!(ids.is_empty());
        assert!(store.is_empty());
        assert!(!temp.path().join(INDEX_FILE).exists());
    }

    #[test]
    fn test_readding_identical_text_duplicates() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        let doc = NewDocument::new("Maintain consistent moisture.").with_meta("source", "ipm.ucanr.edu");

        let first = store.add_documents(std::slice::from_ref(&doc)).unwrap();
        let second = store.add_documents(std::slice::from_ref(&doc)).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = DocStore::open(temp.path()).unwrap();
            store.add_documents(&sample_docs()).unwrap();
        }

        let store = DocStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 3);
        let hits = store.query("wheat water", 1).unwrap();
        assert!(hits[0].text.contains("Wheat"));
    }

    #[test]
    fn test_upsert_replaces_on_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = DocStore::open(temp.path()).unwrap();
            store.upsert("doc-1", "old text", BTreeMap::new()).unwrap();
            store.upsert("doc-1", "new text", BTreeMap::new()).unwrap();
            assert_eq!(store.len(), 1);
        }

        let store = DocStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.peek(1)[0].text, "new text");
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let temp = TempDir::new().unwrap();
        {
            let store = DocStore::open(temp.path()).unwrap();
            store.upsert("doc-1", "good", BTreeMap::new()).unwrap();
        }
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(temp.path().join(INDEX_FILE))
            .unwrap();
        writeln!(file, "{{not json").unwrap();

        let store = DocStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stats() {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        let mut docs = sample_docs();
        docs.push(NewDocument::new("More from FAO.").with_meta("source", "fao.org"));
        store.add_documents(&docs).unwrap();

        let stats = store.stats();
        assert_eq!(stats.document_count, 4);
        assert_eq!(stats.source_count, 3);
        assert!(stats.total_bytes > 0);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(DocStore::open(temp.path()).unwrap());
        store.add_documents(&sample_docs()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    if i == 0 {
                        store
                            .add_documents(&[NewDocument::new("Corn needs nitrogen at V6.")])
                            .unwrap();
                    } else {
                        let hits = store.query("tomato", 2).unwrap();
                        assert_eq!(hits.len(), 2);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 4);
    }
}
