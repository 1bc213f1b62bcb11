//! Integration tests for the auxiliary commands

use crate::helpers::{TestProject, run_fw_release, run_fw_release_failure};
use anyhow::Result;

#[test]
fn test_help_lists_commands() -> Result<()> {
  let project = TestProject::new()?;
  let output = run_fw_release(&project.path, &["--help"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  for command in ["release", "notes", "ci", "download-asset"] {
    assert!(stdout.contains(command), "missing {} in help", command);
  }

  Ok(())
}

#[test]
fn test_download_asset_requires_token() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(
    &project.path,
    &["download-asset", "--repo", "slaclab/demo", "--tag", "v1.0.0", "--asset", "fw.mcs"],
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("GITHUB_TOKEN environment variable not set."), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_ci_requires_environment() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(&project.path, &["ci"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("repository"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_notes_requires_a_tag() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(
    &project.path,
    &["--non-interactive", "notes", "--repo-dir", project.path.to_str().unwrap_or_default()],
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("pass --new"), "stderr: {}", stderr);

  Ok(())
}
