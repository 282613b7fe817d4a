//! CLI tests for ds

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn seed_file() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("data")
        .join("seed_documents.json")
}

fn ds(store: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ds").expect("ds binary");
    cmd.env("NO_COLOR", "1").arg("--store").arg(store.path());
    cmd
}

// =============================================================================
// add / search
// =============================================================================

#[test]
fn test_add_then_search() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ds(&store)
        .arg("add")
        .arg(seed_file())
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 5 documents"));

    ds(&store)
        .args(["search", "light for tomato seedlings", "-k", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fao.org/tomato"))
        .stdout(predicate::str::contains("14-16 hours of light"));
}

#[test]
fn test_search_empty_store() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ds(&store)
        .args(["search", "anything"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No documents found"));
}

#[test]
fn test_add_rejects_non_array() {
    let store = TempDir::new().expect("Failed to create temp dir");
    let input = store.path().join("bad.json");
    std::fs::write(&input, r#"{"text": "not an array"}"#).unwrap();

    ds(&store)
        .arg("add")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected a JSON array"));
}

// =============================================================================
// ingest / stats
// =============================================================================

#[test]
fn test_ingest_and_stats() {
    let store = TempDir::new().expect("Failed to create temp dir");
    let docs = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(docs.path().join("potato.txt"), "Potatoes need hilling at 15 cm plant height.").unwrap();

    let pattern = docs.path().join("*.txt");
    ds(&store)
        .arg("ingest")
        .arg(pattern.to_string_lossy().to_string())
        .args(["--source", "extension.psu.edu/potato"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested 1 chunks"));

    ds(&store)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents: 1"))
        .stdout(predicate::str::contains("Sources: 1"));
}
