//! Release type classification from version strings

use crate::core::error::{ReleaseResult, SelectionError};
use std::fmt;

/// Kind of release, derived from which version component is non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
  /// `X.0.0`
  Major,
  /// `X.Y.0`
  Minor,
  /// `X.Y.Z`
  Patch,
}

impl ReleaseType {
  /// Classify a version such as `v1.2.3`
  ///
  /// One leading `v` is stripped. The last component decides Patch, the
  /// second-to-last decides Minor, anything else is Major. Components are
  /// compared as text against `0`. At least two numeric components are
  /// required.
  pub fn classify(version: &str) -> ReleaseResult<Self> {
    let trimmed = version.strip_prefix('v').unwrap_or(version);
    let parts: Vec<&str> = trimmed.split('.').collect();

    if parts.len() < 2 {
      return Err(invalid(version, "expected at least two dot-separated components"));
    }

    for part in &parts {
      if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(version, &format!("component '{}' is not a number", part)));
      }
    }

    let last = parts[parts.len() - 1];
    let second_last = parts[parts.len() - 2];

    Ok(if last != "0" {
      ReleaseType::Patch
    } else if second_last != "0" {
      ReleaseType::Minor
    } else {
      ReleaseType::Major
    })
  }
}

impl fmt::Display for ReleaseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseType::Major => write!(f, "Major"),
      ReleaseType::Minor => write!(f, "Minor"),
      ReleaseType::Patch => write!(f, "Patch"),
    }
  }
}

/// Parse a CI tag that must name a plain `vA.B.C` release
pub fn parse_release_tag(tag: &str) -> ReleaseResult<semver::Version> {
  let trimmed = tag.strip_prefix('v').unwrap_or(tag);
  let version = semver::Version::parse(trimmed).map_err(|e| invalid(tag, &e.to_string()))?;

  if !version.pre.is_empty() || !version.build.is_empty() {
    return Err(invalid(tag, "not a release version"));
  }

  Ok(version)
}

fn invalid(version: &str, reason: &str) -> crate::core::error::ReleaseError {
  SelectionError::InvalidVersion {
    version: version.to_string(),
    reason: reason.to_string(),
  }
  .into()
}
