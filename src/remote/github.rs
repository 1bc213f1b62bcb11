//! GitHub REST v3 client (blocking)

use super::{NewRelease, PullRequest, ReleaseAsset, RemoteHost, RemoteRelease};
use crate::core::error::{ReleaseError, ReleaseResult, RemoteError, ResultExt};
use crate::utils::file_name;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;
use ureq::Agent;

/// API root used when `GITHUB_API_URL` is not set
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Items per page for list endpoints (GitHub maximum)
const PER_PAGE: usize = 100;

/// Generous enough for large bitstream uploads
const TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Deserialize)]
struct Repository {
  full_name: String,
}

#[derive(Deserialize)]
struct Tag {
  name: String,
}

#[derive(Deserialize)]
struct IssueComment {
  #[serde(default)]
  body: Option<String>,
}

/// Authenticated client bound to one repository
pub struct GitHubClient {
  agent: Agent,
  api_url: String,
  token: String,
  full_name: String,
}

impl GitHubClient {
  /// API root from the environment, or the public GitHub API
  pub fn api_url_from_env() -> String {
    std::env::var("GITHUB_API_URL")
      .ok()
      .filter(|u| !u.is_empty())
      .unwrap_or_else(|| DEFAULT_API_URL.to_string())
  }

  /// Look up a repository and bind the client to it
  pub fn connect(api_url: &str, token: &str, full_name: &str) -> ReleaseResult<Self> {
    let config = Agent::config_builder().timeout_global(Some(TIMEOUT)).build();

    let mut client = Self {
      agent: Agent::new_with_config(config),
      api_url: api_url.trim_end_matches('/').to_string(),
      token: token.to_string(),
      full_name: full_name.to_string(),
    };

    let repo: Repository = client
      .get_json(&format!("/repos/{}", full_name), &[])
      .with_context(|| format!("Failed to look up repository {}", full_name))?;
    client.full_name = repo.full_name;

    Ok(client)
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.api_url, path)
  }

  fn authorization(&self) -> String {
    format!("Bearer {}", self.token)
  }

  fn user_agent() -> String {
    format!("fw-release/{}", env!("CARGO_PKG_VERSION"))
  }

  fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ReleaseResult<T> {
    let url = self.url(path);
    tracing::debug!(%url, "GET");

    let mut request = self
      .agent
      .get(&url)
      .header("Accept", "application/vnd.github+json")
      .header("Authorization", self.authorization())
      .header("User-Agent", Self::user_agent())
      .header("X-GitHub-Api-Version", "2022-11-28");
    for (key, value) in query {
      request = request.query(*key, value.as_str());
    }

    let mut response = request.call().map_err(|e| remote_error(&url, e))?;
    response
      .body_mut()
      .read_json::<T>()
      .map_err(|e| remote_error(&url, e))
  }

  /// Fetch every page of a list endpoint
  fn get_paginated<T: DeserializeOwned>(&self, path: &str) -> ReleaseResult<Vec<T>> {
    let mut items = Vec::new();

    for page in 1.. {
      let batch: Vec<T> = self.get_json(
        path,
        &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
      )?;
      let done = batch.len() < PER_PAGE;
      items.extend(batch);
      if done {
        break;
      }
    }

    Ok(items)
  }
}

impl RemoteHost for GitHubClient {
  fn full_name(&self) -> &str {
    &self.full_name
  }

  fn tags(&self) -> ReleaseResult<Vec<String>> {
    let tags: Vec<Tag> = self.get_paginated(&format!("/repos/{}/tags", self.full_name))?;
    Ok(tags.into_iter().map(|t| t.name).collect())
  }

  fn pull_request(&self, number: u64) -> ReleaseResult<PullRequest> {
    self.get_json(&format!("/repos/{}/pulls/{}", self.full_name, number), &[])
  }

  fn issue_comments(&self, number: u64) -> ReleaseResult<Vec<String>> {
    let comments: Vec<IssueComment> =
      self.get_paginated(&format!("/repos/{}/issues/{}/comments", self.full_name, number))?;
    Ok(comments.into_iter().filter_map(|c| c.body).collect())
  }

  fn find_release(&self, tag: &str) -> ReleaseResult<Option<RemoteRelease>> {
    match self.get_json(&format!("/repos/{}/releases/tags/{}", self.full_name, tag), &[]) {
      Ok(release) => Ok(Some(release)),
      Err(ReleaseError::Remote(RemoteError::Status { status: 404, .. })) => Ok(None),
      Err(e) => Err(e),
    }
  }

  fn create_release(&self, release: &NewRelease) -> ReleaseResult<RemoteRelease> {
    let url = self.url(&format!("/repos/{}/releases", self.full_name));
    tracing::debug!(%url, tag = %release.tag_name, "POST");

    let mut response = self
      .agent
      .post(&url)
      .header("Accept", "application/vnd.github+json")
      .header("Authorization", self.authorization())
      .header("User-Agent", Self::user_agent())
      .header("X-GitHub-Api-Version", "2022-11-28")
      .send_json(release)
      .map_err(|e| remote_error(&url, e))?;

    response
      .body_mut()
      .read_json::<RemoteRelease>()
      .map_err(|e| remote_error(&url, e))
  }

  fn upload_asset(&self, release: &RemoteRelease, path: &Path) -> ReleaseResult<ReleaseAsset> {
    // upload_url is a URI template: ".../assets{?name,label}"
    let url = release.upload_url.split('{').next().unwrap_or_default().to_string();
    let name = file_name(path)?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(%url, %name, size = bytes.len(), "POST asset");

    let mut response = self
      .agent
      .post(&url)
      .query("name", name.as_str())
      .header("Accept", "application/vnd.github+json")
      .header("Authorization", self.authorization())
      .header("User-Agent", Self::user_agent())
      .header("Content-Type", "application/octet-stream")
      .send(&bytes[..])
      .map_err(|e| remote_error(&url, e))?;

    response
      .body_mut()
      .read_json::<ReleaseAsset>()
      .map_err(|e| remote_error(&url, e))
  }

  fn download_asset(&self, asset: &ReleaseAsset, dest: &Path) -> ReleaseResult<u64> {
    tracing::debug!(url = %asset.url, "GET asset");

    let mut response = self
      .agent
      .get(&asset.url)
      .header("Accept", "application/octet-stream")
      .header("Authorization", self.authorization())
      .header("User-Agent", Self::user_agent())
      .call()
      .map_err(|e| remote_error(&asset.url, e))?;

    let mut file = File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    let written = io::copy(&mut response.body_mut().as_reader(), &mut file)
      .with_context(|| format!("Failed to download {}", asset.name))?;

    Ok(written)
  }
}

fn remote_error(url: &str, err: ureq::Error) -> ReleaseError {
  match err {
    ureq::Error::StatusCode(status) => RemoteError::Status {
      url: url.to_string(),
      status,
    },
    other => RemoteError::Transport {
      url: url.to_string(),
      reason: other.to_string(),
    },
  }
  .into()
}
