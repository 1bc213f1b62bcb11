//! `ci`: publish the release of a tag pushed by a CI build

use crate::core::error::ReleaseResult;
use crate::core::prompt::{NoPrompt, Resolver};
use crate::core::vcs::SystemGit;
use crate::release::publish::publish_existing_tag;
use crate::remote::GitHubClient;
use std::path::Path;

/// Values fall back to the `TRAVIS_REPO_SLUG`, `TRAVIS_TAG` and
/// `GH_REPO_TOKEN` variables of the CI environment. Nothing is prompted.
pub fn run_ci(repo_dir: &Path, repo: Option<String>, tag: Option<String>, token: Option<String>) -> ReleaseResult<()> {
  let mut no_prompt = NoPrompt;
  let repo = Resolver::new("repository")
    .explicit(repo)
    .env("TRAVIS_REPO_SLUG")
    .require(&mut no_prompt)?;
  let token = Resolver::new("GitHub token")
    .explicit(token)
    .env("GH_REPO_TOKEN")
    .require(&mut no_prompt)?;
  let tag = Resolver::new("release tag")
    .explicit(tag)
    .env("TRAVIS_TAG")
    .require(&mut no_prompt)?;

  let org = repo.split('/').next().unwrap_or_default().to_string();
  let git = SystemGit::open(repo_dir)?;
  let host = GitHubClient::connect(&GitHubClient::api_url_from_env(), &token, &repo)?;

  publish_existing_tag(&git, &host, &tag, &org)?;
  println!("Success!");

  Ok(())
}
