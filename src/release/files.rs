//! File set collection for package sources
//!
//! Each configured directory is walked recursively and every folder and file
//! below it becomes one [`FileEntry`], addressed relative to that directory.
//! Byte-code caches and nested `build` output directories never end up in a
//! package.

use crate::core::error::{ReleaseResult, ResultExt};
use crate::utils::archive_path;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Python byte-code cache directory name fragment
const PYCACHE: &str = "__pycache__";

/// Build output directory name
const BUILD_DIR: &str = "build";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  Folder,
  File,
}

/// One collected folder or file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
  pub kind: EntryKind,
  /// Absolute location on disk
  pub full_path: PathBuf,
  /// Location below the collected root, `/`-separated
  pub sub_path: String,
}

impl FileEntry {
  pub fn is_file(&self) -> bool {
    self.kind == EntryKind::File
  }
}

fn is_excluded(entry: &DirEntry) -> bool {
  let name = entry.file_name().to_string_lossy();
  name.contains(PYCACHE) || (entry.file_type().is_dir() && name == BUILD_DIR)
}

/// Collect every folder and file below the given directories
///
/// Paths are resolved against `project_dir`. Entries are ordered by root,
/// then depth-first by file name. A root that does not exist contributes
/// nothing.
pub fn select_directories(project_dir: &Path, dirs: &[PathBuf]) -> ReleaseResult<Vec<FileEntry>> {
  let mut entries = Vec::new();

  for dir in dirs {
    let base = std::path::absolute(project_dir.join(dir))
      .with_context(|| format!("Failed to resolve directory {}", dir.display()))?;

    if !base.is_dir() {
      tracing::warn!(path = %base.display(), "configured directory does not exist, skipping");
      continue;
    }

    let walker = WalkDir::new(&base)
      .min_depth(1)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

    for entry in walker {
      let entry = entry?;
      let sub_path = archive_path(entry.path().strip_prefix(&base)?);
      let kind = if entry.file_type().is_dir() {
        EntryKind::Folder
      } else {
        EntryKind::File
      };

      entries.push(FileEntry {
        kind,
        full_path: entry.into_path(),
        sub_path,
      });
    }
  }

  Ok(entries)
}
