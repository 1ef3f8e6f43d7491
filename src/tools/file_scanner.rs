use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

/// Lists the regular files directly inside `directory`, sorted by file name.
/// Subdirectories are skipped, not descended into.
pub fn scan_source_files(directory: &Path) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry =
            entry.with_context(|| format!("cannot read directory {}", directory.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = entry
            .metadata()
            .with_context(|| format!("cannot stat {}", entry.path().display()))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();

        files.push(SourceFile {
            path: entry.into_path(),
            file_name,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}
