//! Utilities related to paths.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Returns whether `path` has one of `extensions`, ignoring case.
#[must_use]
pub fn has_extension_icase(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .is_some_and(|ext| extensions.iter().any(|ele| ext.eq_ignore_ascii_case(ele)))
}

/// Attempts to find files in `dir` with file extensions in `extensions`.
///
/// This is case-insensitive and not recursive. Directories are skipped
/// even when their name looks like a match.
///
/// ## Errors
///
/// - if `dir` is not a directory
/// - if [`Path::read_dir`] fails
pub fn find_extensions_icase(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let dir_display = dir.display();

    if !dir.is_dir() {
        bail!("expected dir={dir_display} to be a directory");
    }

    let found: Vec<_> = dir
        .read_dir()
        .with_context(|| format!("failed to read entries of dir={dir_display}"))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension_icase(p, extensions))
        .collect();

    Ok(found)
}
