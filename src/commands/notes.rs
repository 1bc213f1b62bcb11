//! `notes`: print release notes for a tag range

use super::{connect_origin, resolve_token};
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::core::prompt::Prompt;
use crate::core::vcs::SystemGit;
use crate::release::notes;
use std::path::Path;

/// Print notes for `old...new`
///
/// `new` defaults to `git describe --tags` of HEAD and `old` to the tag
/// before `new`.
pub fn run_notes(
  repo_dir: &Path,
  old: Option<String>,
  new: Option<String>,
  org: &str,
  token: Option<String>,
  prompt: &mut dyn Prompt,
) -> ReleaseResult<()> {
  let git = SystemGit::open(repo_dir)?;

  let new = match new {
    Some(tag) => tag,
    None => git.describe_head().context("Failed to find a tag at HEAD; pass --new")?,
  };
  let old = match old {
    Some(tag) => tag,
    None => git
      .previous_tag(&new)
      .with_context(|| format!("Failed to find a tag before {}; pass --old", new))?
      .ok_or_else(|| ReleaseError::with_help(format!("{} is the first tag", new), "Pass --old to pick the range start"))?,
  };

  let token = resolve_token(token, prompt)?;
  let host = connect_origin(&git, org, &token)?;

  let md = notes::generate(&git, &host, &old, &new, org)?;
  println!("{}", md);

  Ok(())
}
