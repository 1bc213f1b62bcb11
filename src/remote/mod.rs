//! Remote hosting access
//!
//! Everything the release pipeline needs from the hosting service sits
//! behind [`RemoteHost`]; [`github::GitHubClient`] implements it over the
//! GitHub REST API.

pub mod github;

#[cfg(test)]
pub(crate) mod fake;

use crate::core::error::{ReleaseResult, RemoteError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use github::GitHubClient;

/// Branch reference of a pull request (`owner:branch`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchRef {
  pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
  pub name: String,
}

/// Pull request fields used for release notes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequest {
  pub number: u64,
  pub title: String,
  #[serde(default)]
  pub body: Option<String>,
  #[serde(default)]
  pub additions: u64,
  #[serde(default)]
  pub deletions: u64,
  #[serde(default)]
  pub changed_files: u64,
  #[serde(default)]
  pub base: BranchRef,
  #[serde(default)]
  pub head: BranchRef,
  #[serde(default)]
  pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
  pub id: u64,
  pub name: String,
  /// API URL of the asset (not the browser download URL)
  pub url: String,
  #[serde(default)]
  pub size: u64,
}

/// A release object on the hosting service
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRelease {
  pub id: u64,
  pub tag_name: String,
  #[serde(default)]
  pub name: Option<String>,
  pub html_url: String,
  pub upload_url: String,
  #[serde(default)]
  pub assets: Vec<ReleaseAsset>,
}

/// Payload for creating a release
#[derive(Debug, Clone, Serialize)]
pub struct NewRelease {
  pub tag_name: String,
  pub name: String,
  pub body: String,
  pub draft: bool,
}

/// Operations the release pipeline needs from a hosting service
pub trait RemoteHost {
  /// `owner/name` of the repository
  fn full_name(&self) -> &str;

  /// All tag names
  fn tags(&self) -> ReleaseResult<Vec<String>>;

  fn pull_request(&self, number: u64) -> ReleaseResult<PullRequest>;

  /// Bodies of the conversation comments on a pull request
  fn issue_comments(&self, number: u64) -> ReleaseResult<Vec<String>>;

  /// Release for a tag, `None` when there is none
  fn find_release(&self, tag: &str) -> ReleaseResult<Option<RemoteRelease>>;

  fn create_release(&self, release: &NewRelease) -> ReleaseResult<RemoteRelease>;

  /// Upload a file as a release asset named after its file name
  fn upload_asset(&self, release: &RemoteRelease, path: &Path) -> ReleaseResult<ReleaseAsset>;

  /// Download an asset into `dest`, returning the byte count
  fn download_asset(&self, asset: &ReleaseAsset, dest: &Path) -> ReleaseResult<u64>;
}

/// Derive `org/name` from a git remote URL
///
/// Works for both `git@github.com:org/name(.git)` and
/// `https://github.com/org/name(.git)`.
pub fn repo_name_from_url(url: &str, org: &str) -> ReleaseResult<String> {
  let normalized = if url.ends_with(".git") {
    url.to_string()
  } else {
    format!("{}.git", url)
  };

  let pattern = Regex::new(&format!(r"{}/(?P<name>.*?)\.git", regex::escape(org)))?;

  pattern
    .captures(&normalized)
    .and_then(|c| c.name("name"))
    .map(|m| format!("{}/{}", org, m.as_str()))
    .filter(|full| full.len() > org.len() + 1)
    .ok_or_else(|| {
      RemoteError::UnknownRepository {
        url: url.to_string(),
        org: org.to_string(),
      }
      .into()
    })
}
