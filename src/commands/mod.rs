//! CLI commands for fw-release
//!
//! - **release**: select builds, package them and optionally tag and publish
//! - **notes**: print release notes for a tag range
//! - **ci**: publish a release for a tag already pushed by CI
//! - **download-asset**: fetch one attachment of a published release

pub mod asset;
pub mod ci;
pub mod notes;
pub mod release;

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::prompt::{Prompt, Resolver};
use crate::core::vcs::SystemGit;
use crate::remote::{GitHubClient, repo_name_from_url};

pub use asset::run_download_asset;
pub use ci::run_ci;
pub use notes::run_notes;
pub use release::{ReleaseOptions, run_release};

const TOKEN_QUESTION: &str = "Enter your github token. If you do not have one you can generate it here:
    https://github.com/settings/tokens
You may set it in your environment as GITHUB_TOKEN

Github token: ";

/// Token from the command line, then `GITHUB_TOKEN`, then the terminal
fn resolve_token(token: Option<String>, prompt: &mut dyn Prompt) -> ReleaseResult<String> {
  Resolver::new("GitHub token")
    .explicit(token)
    .env("GITHUB_TOKEN")
    .interactive(TOKEN_QUESTION)
    .require(prompt)
}

/// Connect to the repository `origin` points at
fn connect_origin(git: &SystemGit, org: &str, token: &str) -> ReleaseResult<GitHubClient> {
  let url = git.remote_url("origin")?.ok_or_else(|| {
    ReleaseError::with_help(
      format!("No origin remote in {}", git.work_tree().display()),
      "Add the GitHub repository as origin: git remote add origin <url>",
    )
  })?;
  let full_name = repo_name_from_url(&url, org)?;

  println!("\n🔑 Logging into github as {}....", full_name);
  GitHubClient::connect(&GitHubClient::api_url_from_env(), token, &full_name)
}
