//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Outcome of a merge copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Files written to the destination.
    pub copied: Vec<PathBuf>,
    /// Destination files that already existed and were left untouched.
    pub skipped: Vec<PathBuf>,
}

/// Recursively copy `src` into `dst`, merging directories.
///
/// A file that already exists in `dst` is skipped, never overwritten.
/// Entries are visited in file-name order.
pub fn copy_dir_merge(src: &Path, dst: &Path) -> Result<MergeStats> {
    let mut stats = MergeStats::default();
    ensure_dir(dst)?;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", src.display()))?;
        let rel = relative_path(src, entry.path());
        let target = dst.join(&rel);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if target.exists() {
            tracing::debug!("keeping existing {}", target.display());
            stats.skipped.push(rel);
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            stats.copied.push(rel);
        }
    }

    Ok(stats)
}

/// Copy a file into a directory, keeping its file name.
pub fn copy_file_to_dir(file: &Path, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let name = file
        .file_name()
        .with_context(|| format!("not a file path: {}", file.display()))?;
    let target = dir.join(name);
    fs::copy(file, &target)
        .with_context(|| format!("failed to copy {} to {}", file.display(), target.display()))?;
    Ok(target)
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Leave `path` as an existing, empty directory.
pub fn create_or_clean_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        for entry in fs::read_dir(path)
            .with_context(|| format!("failed to read directory: {}", path.display()))?
        {
            let entry = entry?;
            let entry_path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&entry_path).with_context(|| {
                    format!("failed to remove directory: {}", entry_path.display())
                })?;
            } else {
                fs::remove_file(&entry_path).with_context(|| {
                    format!("failed to remove file: {}", entry_path.display())
                })?;
            }
        }
        Ok(())
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))
    }
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Create an empty file (and its parents) if it doesn't exist.
pub fn touch_file(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    write_string(path, "")
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
