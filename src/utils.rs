//! Path and digest helpers

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Component, Path};

/// Convert a relative path to archive member format (always forward slashes)
///
/// Archive formats expect `/` separators even on Windows. `.` components
/// are dropped.
pub fn archive_path(path: &Path) -> String {
  path
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      Component::ParentDir => Some("..".to_string()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// Final component of a path as UTF-8
pub fn file_name(path: &Path) -> ReleaseResult<String> {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .map(|n| n.to_string())
    .ok_or_else(|| ReleaseError::message(format!("Path has no usable file name: {}", path.display())))
}

/// Hex-encoded SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> ReleaseResult<String> {
  let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher)?;
  Ok(format!("{:x}", hasher.finalize()))
}
