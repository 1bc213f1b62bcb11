//! `download-asset`: fetch one attachment of a published release

use crate::core::error::{ReleaseError, ReleaseResult, RemoteError};
use crate::core::prompt::{NoPrompt, Resolver};
use crate::remote::{GitHubClient, RemoteHost};
use std::path::{Path, PathBuf};

/// Download `asset` of release `tag` into `output` (current directory by default)
///
/// Works for private repositories; the token comes from `GITHUB_TOKEN`.
pub fn run_download_asset(repo: &str, tag: &str, asset: &str, output: Option<PathBuf>) -> ReleaseResult<()> {
  let token = Resolver::new("GitHub token")
    .env("GITHUB_TOKEN")
    .require(&mut NoPrompt)
    .map_err(|e| e.context("GITHUB_TOKEN environment variable not set."))?;

  let out_dir = match output {
    Some(dir) => dir,
    None => std::env::current_dir()?,
  };

  let host = GitHubClient::connect(&GitHubClient::api_url_from_env(), &token, repo)?;
  let (path, size) = download_named_asset(&host, tag, asset, &out_dir)?;

  println!("✅ Downloaded {} ({} bytes)", path.display(), size);
  Ok(())
}

fn download_named_asset(host: &dyn RemoteHost, tag: &str, name: &str, out_dir: &Path) -> ReleaseResult<(PathBuf, u64)> {
  let release = host.find_release(tag)?.ok_or_else(|| {
    ReleaseError::with_help(
      format!("No release for tag {} in {}", tag, host.full_name()),
      "Check the tag name on the repository's releases page.",
    )
  })?;

  let asset = release
    .assets
    .iter()
    .find(|a| a.name == name)
    .ok_or_else(|| RemoteError::AssetNotFound {
      tag: tag.to_string(),
      asset: name.to_string(),
    })?;

  let dest = out_dir.join(&asset.name);
  let size = host.download_asset(asset, &dest)?;
  Ok((dest, size))
}
