use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `.txt` or `.text`, ignoring case.
pub fn is_text_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_lowercase)
        .is_some_and(|name| name.ends_with(".txt") || name.ends_with(".text"))
}

/// A file root is returned as is; a directory is walked recursively for text
/// files. Entries that cannot be read are logged and skipped.
pub fn text_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(anyhow!("no such file or directory: {}", root.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_text_file(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, "skipping unreadable entry"),
        }
    }
    Ok(files)
}
