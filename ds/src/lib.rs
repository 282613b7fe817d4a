//! DocStore - append-only document index with semantic lookup
//!
//! Stores verified text passages with citation metadata and answers nearest
//! neighbour queries against them. Used as the retrieval backend of the
//! farm agent, and inspectable through the `ds` CLI.
//!
//! # Architecture
//!
//! ```text
//! {store_path}/
//! └── index.jsonl      # one StoredDocument per line, append-only
//! ```
//!
//! Embeddings are recomputed in memory when the store is opened; only text
//! and metadata are persisted.
//!
//! # Example
//!
//! ```ignore
//! use docstore::{DocStore, DocumentIndex, NewDocument};
//!
//! let store = DocStore::open("data/index")?;
//! store.add_documents(&[NewDocument::new("Tomatoes prefer pH 6.0-6.8.").with_meta("source", "usda.gov")])?;
//! let hits = store.query("soil ph for tomato", 3)?;
//! ```

mod chunk;
pub mod cli;
pub mod config;
mod embed;
mod store;

pub use chunk::chunk_text;
pub use embed::{EMBEDDING_DIM, Embedder, TokenHashEmbedder, cosine_distance, tokenize};
pub use store::{DocId, DocStore, DocumentIndex, INDEX_FILE, NewDocument, ScoredDocument, StoreStats, StoredDocument};

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between chunks in characters
pub const DEFAULT_OVERLAP: usize = 0;
