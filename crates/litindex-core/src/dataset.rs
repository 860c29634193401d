//! Loading tabular batches exported as JSON.
//!
//! A dataset is a `.json` file holding an array of row objects, a
//! `.jsonl`/`.ndjson` file with one row object per line, or a directory
//! walked recursively for such files (sorted by path).
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::RawRecord;

const EXTENSIONS: [&str; 3] = ["json", "jsonl", "ndjson"];

pub fn load(path: &Path) -> Result<Vec<RawRecord>> {
    let files = if path.is_dir() {
        list_dataset_files(path)
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(Error::Dataset { path: path.to_path_buf(), reason: "no such file or directory".to_string() });
    };
    let mut rows = Vec::new();
    for file in &files {
        let before = rows.len();
        rows.extend(read_file(file)?);
        debug!(file = %file.display(), rows = rows.len() - before, "read dataset file");
    }
    info!(path = %path.display(), files = files.len(), rows = rows.len(), "dataset loaded");
    Ok(rows)
}

fn read_file(path: &Path) -> Result<Vec<RawRecord>> {
    let fail = |reason: String| Error::Dataset { path: path.to_path_buf(), reason };
    let content = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content).map_err(|e| fail(e.to_string()));
    }
    let mut rows = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        let row = serde_json::from_str::<RawRecord>(line).map_err(|e| fail(format!("line {}: {}", n + 1, e)))?;
        rows.push(row);
    }
    Ok(rows)
}

fn list_dataset_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()).is_some_and(|ext| EXTENSIONS.contains(&ext)) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
