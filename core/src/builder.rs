//! Builds an index from text files, either inline or one pool task per file.

use crate::files::text_files;
use crate::index::InvertedIndex;
use crate::pool::WorkerPool;
use crate::safe_index::ThreadSafeIndex;
use crate::tokenizer;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Adds every stemmed word of `path` to `index`, numbering positions from 1
/// across the whole file. The location is the path as displayed.
pub fn stem_file(path: &Path, index: &mut InvertedIndex) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let location = path.display().to_string();
    let mut position = 1;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        for term in tokenizer::stems(&line) {
            index.add(&term, &location, position);
            position += 1;
        }
    }
    Ok(())
}

/// Single-threaded build. Files that fail to read are logged and skipped.
pub fn build_index(root: &Path, index: &mut InvertedIndex) -> Result<()> {
    let files = text_files(root)?;
    for path in &files {
        if let Err(err) = stem_file(path, index) {
            tracing::warn!(error = %err, "skipping file");
        }
    }
    tracing::info!(files = files.len(), terms = index.num_terms(), "index built");
    Ok(())
}

/// Submits one task per text file under `root` and blocks until all of them
/// have merged their local index into `index`.
pub fn build_index_concurrently(
    root: &Path,
    index: &Arc<ThreadSafeIndex>,
    pool: &WorkerPool,
) -> Result<()> {
    let files = text_files(root)?;
    let total = files.len();
    for path in files {
        let index = Arc::clone(index);
        pool.execute(move || index_file(path, &index))?;
    }
    pool.finish();
    tracing::info!(files = total, terms = index.num_terms(), "index built");
    Ok(())
}

fn index_file(path: PathBuf, shared: &ThreadSafeIndex) {
    let mut local = InvertedIndex::new();
    match stem_file(&path, &mut local) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), words = local.num_counted(), "merging local index");
            shared.merge(local);
        }
        Err(err) => tracing::warn!(error = %err, "skipping file"),
    }
}
