//! Tag, remote and log operations for SystemGit

use super::system_git::SystemGit;
use crate::core::error::{GitError, ReleaseError, ReleaseResult};

/// Commit message marker GitHub writes for merged pull requests
pub const MERGE_MARKER: &str = "Merge pull request";

impl SystemGit {
  /// List all local tags
  pub fn list_tags(&self) -> ReleaseResult<Vec<String>> {
    let stdout = self.run(&["tag", "--list"])?;

    Ok(
      stdout
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
    )
  }

  /// Check whether a local tag exists
  pub fn has_tag(&self, tag: &str) -> ReleaseResult<bool> {
    Ok(self.list_tags()?.iter().any(|t| t == tag))
  }

  /// Create an annotated tag at HEAD
  pub fn create_annotated_tag(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", tag, "-m", message])?;
    Ok(())
  }

  /// Delete a local tag
  pub fn delete_tag(&self, tag: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-d", tag])?;
    Ok(())
  }

  /// Push a single tag to a remote
  pub fn push_tag(&self, remote_name: &str, tag: &str) -> ReleaseResult<()> {
    let refspec = format!("refs/tags/{}", tag);
    self.push_refspec(remote_name, &refspec)
  }

  /// Delete a tag ref on a remote
  pub fn delete_remote_tag(&self, remote_name: &str, tag: &str) -> ReleaseResult<()> {
    let refspec = format!(":refs/tags/{}", tag);
    self.push_refspec(remote_name, &refspec)
  }

  fn push_refspec(&self, remote_name: &str, refspec: &str) -> ReleaseResult<()> {
    let output = self.output(&["push", remote_name, refspec])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: remote_name.to_string(),
        refspec: refspec.to_string(),
        reason: stderr.trim().to_string(),
      }));
    }

    Ok(())
  }

  /// Fetch URL of a remote, `None` when no remote of that name is configured
  pub fn remote_url(&self, name: &str) -> ReleaseResult<Option<String>> {
    let output = self.output(&["remote", "get-url", name])?;

    if output.status.success() {
      let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
      return Ok(Some(url));
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("No such remote") {
      return Ok(None);
    }

    Err(ReleaseError::Git(GitError::CommandFailed {
      command: format!("git remote get-url {}", name),
      stderr,
    }))
  }

  /// Medium-format log of merged pull requests in `old...new`
  pub fn merge_log(&self, old: &str, new: &str) -> ReleaseResult<String> {
    let range = format!("{}...{}", old, new);
    self.run(&["log", "--pretty=medium", &range, "--grep", MERGE_MARKER])
  }

  /// Most recent tag reachable from HEAD, with distance suffix when not on it
  pub fn describe_head(&self) -> ReleaseResult<String> {
    Ok(self.run(&["describe", "--tags"])?.trim().to_string())
  }

  /// Tag preceding `tag` in history, `None` when `tag` is the first one
  ///
  /// Any other describe failure (unknown tag, shallow history) is an error.
  pub fn previous_tag(&self, tag: &str) -> ReleaseResult<Option<String>> {
    let rev = format!("{}^", tag);
    let args = ["describe", "--abbrev=0", "--tags", rev.as_str()];
    let output = self.output(&args)?;

    if output.status.success() {
      return Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()));
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains("No names found") || stderr.contains("cannot describe") {
      tracing::debug!("no tag before {}: {}", tag, stderr);
      return Ok(None);
    }

    Err(ReleaseError::Git(GitError::CommandFailed {
      command: format!("git {}", args.join(" ")),
      stderr,
    }))
  }
}
