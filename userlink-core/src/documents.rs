//! Parallel, deterministic discovery of stored documents.
//!
//! Directories are pruned with `WalkDir::filter_entry` before iteration, and
//! the remaining entries are filtered on a Rayon pool via `par_bridge`.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories to exclude by default.
pub const EXCLUDED_DIRS: &[&str] = &[".git", ".userlink"];

/// Extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["xml", "storage", "html"];

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

#[inline]
fn has_extension(path: &Path, extensions: &HashSet<&str>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(ext.to_ascii_lowercase().as_str()))
}

/// Gathers every document under `root` with one of `extensions`.
///
/// `excludes` adds to [`EXCLUDED_DIRS`]. Extensions are matched without the
/// leading dot, case-insensitively. The result is sorted so batch reports
/// come out in a stable order.
pub fn gather_documents(
    root: &Path,
    extensions: &[&str],
    excludes: &[&str],
) -> Result<Vec<PathBuf>> {
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().copied())
        .collect();
    let lowered: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();
    let wanted: HashSet<&str> = lowered.iter().map(String::as_str).collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && has_extension(path, &wanted) {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to gather documents from {}", root.display()))?;

    files.par_sort();
    Ok(files)
}
