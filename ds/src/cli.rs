//! CLI argument parsing for docstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ds")]
#[command(author, version, about = "Verified agronomy document index", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides config)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk text files and add them to the index
    Ingest {
        /// File paths or glob patterns to ingest
        #[arg(required = true)]
        paths: Vec<String>,

        /// Chunk size in characters
        #[arg(short = 'z', long)]
        chunk_size: Option<usize>,

        /// Overlap between chunks in characters
        #[arg(short, long)]
        overlap: Option<usize>,

        /// Citation to record as `source` (defaults to the file path)
        #[arg(long)]
        source: Option<String>,
    },

    /// Add documents from a JSON file: [{"text": "...", "metadata": {...}}]
    Add {
        /// JSON file to read
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Semantic search against the index
    Search {
        /// Query text
        #[arg(required = true)]
        query: String,

        /// Number of results
        #[arg(short = 'k', long, default_value = "3")]
        top_k: usize,
    },

    /// Show the first documents in the index
    Peek {
        /// Number of documents to show
        #[arg(short = 'n', long, default_value = "3")]
        limit: usize,
    },

    /// Show statistics for the index
    Stats,
}
