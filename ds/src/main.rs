use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

use docstore::cli::{Cli, Command};
use docstore::config::Config;
use docstore::{DocStore, DocumentIndex, NewDocument, chunk_text};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

/// Read `[{"text": ..., "metadata": {...}}]`, stringifying scalar metadata values
fn read_documents(path: &Path) -> Result<Vec<NewDocument>> {
    let content = std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content).context("Input is not valid JSON")?;
    let items = value.as_array().ok_or_else(|| eyre!("Expected a JSON array of documents"))?;

    let mut docs = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let text = item["text"]
            .as_str()
            .ok_or_else(|| eyre!("Document {} has no \"text\" string", i))?;
        let mut metadata = BTreeMap::new();
        if let Some(map) = item["metadata"].as_object() {
            for (k, v) in map {
                let v = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                metadata.insert(k.clone(), v);
            }
        }
        docs.push(NewDocument {
            text: text.to_string(),
            metadata,
        });
    }
    Ok(docs)
}

fn ingest(store: &DocStore, patterns: &[String], chunk_size: usize, overlap: usize, source: Option<&str>) -> Result<usize> {
    let mut total = 0;
    for pattern in patterns {
        let paths = glob::glob(pattern).context(format!("Invalid glob pattern: {}", pattern))?;

        for entry in paths {
            let path = entry?;
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path).context(format!("Failed to read file: {}", path.display()))?;
            let source = source.map(str::to_string).unwrap_or_else(|| path.to_string_lossy().to_string());

            let docs: Vec<NewDocument> = chunk_text(&content, chunk_size, overlap)
                .into_iter()
                .enumerate()
                .map(|(i, chunk)| {
                    NewDocument::new(chunk)
                        .with_meta("source", source.clone())
                        .with_meta("chunk", i.to_string())
                })
                .collect();

            store.add_documents(&docs)?;
            info!("Ingested {} chunks from {}", docs.len(), path.display());
            total += docs.len();
        }
    }
    Ok(total)
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.clone().unwrap_or(config.store_path.clone());

    info!("docstore starting at {}", store_path.display());
    let store = DocStore::open(&store_path)?;

    match cli.command {
        Command::Ingest {
            paths,
            chunk_size,
            overlap,
            source,
        } => {
            let count = ingest(
                &store,
                &paths,
                chunk_size.unwrap_or(config.chunk_size),
                overlap.unwrap_or(config.overlap),
                source.as_deref(),
            )?;
            println!("{} Ingested {} chunks", "✓".green(), count.to_string().cyan());
        }
        Command::Add { file } => {
            let docs = read_documents(&file)?;
            let ids = store.add_documents(&docs)?;
            println!("{} Added {} documents", "✓".green(), ids.len().to_string().cyan());
        }
        Command::Search { query, top_k } => {
            let hits = store.query(&query, top_k)?;
            if hits.is_empty() {
                println!("No documents found");
            }
            for hit in hits {
                let source = hit.metadata.get("source").map(String::as_str).unwrap_or("unknown");
                println!("{} {} {}", format!("{:.4}", hit.distance).dimmed(), source.yellow(), hit.text);
            }
        }
        Command::Peek { limit } => {
            let docs = store.peek(limit);
            if docs.is_empty() {
                println!("(Empty)");
            }
            for (i, doc) in docs.iter().enumerate() {
                let preview: String = doc.text.chars().take(100).collect();
                println!("  {}. {}...", i + 1, preview);
                println!("     {} {:?}", "Meta:".dimmed(), doc.metadata);
            }
        }
        Command::Stats => {
            let stats = store.stats();
            println!("Store: {}", store.path().display().to_string().cyan());
            println!("  Documents: {}", stats.document_count);
            println!("  Total bytes: {}", stats.total_bytes);
            println!("  Sources: {}", stats.source_count);
        }
    }

    Ok(())
}
