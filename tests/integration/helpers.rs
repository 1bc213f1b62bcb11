//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Build name used by the default fixture images
pub const BUILD: &str = "fpgaA-v1-20240101-user-abcdef";

/// Older build in the same image directory
pub const OLD_BUILD: &str = "fpgaA-v0-20231201-user-111111";

pub const RELEASES_YAML: &str = r#"GitBase: .
TopRoguePackage: demo
RoguePackages: python
RogueConfig: config
RogueScripts:
  - scripts/run_gui.py
CpswSource: yaml
CpswConfig: cpsw-config
Targets:
  fpgaA:
    ImageDir: images
    Extensions:
      - bin
      - mcs
Releases:
  demo:
    Primary: true
    Targets:
      - fpgaA
    Types:
      - Rogue
      - CPSW
"#;

/// A firmware project checked into git, with build images on disk
pub struct TestProject {
  _root: TempDir,
  /// Project directory (also the git checkout)
  pub path: PathBuf,
  /// Directory the archives are written to
  pub out: PathBuf,
}

impl TestProject {
  /// Create a project with one primary release producing both package kinds
  pub fn new() -> Result<Self> {
    Self::with_config(RELEASES_YAML)
  }

  pub fn with_config(releases_yaml: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("project");
    let out = root.path().join("out");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(&out)?;

    git(&path, &["init", "--initial-branch=main"])?;

    let project = Self { _root: root, path, out };

    project.write("releases.yaml", releases_yaml)?;
    project.write("LICENSE.txt", "Test license\n")?;
    project.write("README.md", "# Demo firmware\n")?;
    project.write(
      "python/demo/__init__.py",
      "import os\nimport pyrogue\nfrom demo._Core import *\n__version__ = 'dev'\nConfigDir = os.path.join(os.path.dirname(__file__), '../../config')\nImageDir = '../../images'\n",
    )?;
    project.write("python/demo/_Core.py", "class Core:\n    pass\n")?;
    project.write("python/demo/__pycache__/_Core.cpython-39.pyc", "cache")?;
    project.write("config/defaults.yml", "Root:\n  Enable: True\n")?;
    project.write("scripts/run_gui.py", "import demo\n")?;
    project.write("yaml/000TopLevel.yaml", "top: 1\n")?;
    project.write("yaml/app/AppCore.yaml", "core: 1\n")?;
    project.write("cpsw-config/defaults.yaml", "cfg: 1\n")?;

    for image in [
      format!("{}.bin", BUILD),
      format!("{}.mcs", BUILD),
      format!("{}_primary.mcs", BUILD),
      format!("{}.bin", OLD_BUILD),
    ] {
      project.write(&format!("images/{}", image), &image)?;
    }

    git(&project.path, &["add", "."])?;
    git(&project.path, &["commit", "-m", "Initial firmware project"])?;

    Ok(project)
  }

  /// Write a file relative to the project directory
  pub fn write(&self, rel: &str, content: &str) -> Result<()> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
  }

  /// Local tags of the checkout
  pub fn tags(&self) -> Result<Vec<String>> {
    Ok(git(&self.path, &["tag", "--list"])?.lines().map(String::from).collect())
  }

  /// `release` arguments selecting the default release non-interactively
  pub fn release_args<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
      "--non-interactive",
      "release",
      "--project",
      self.path.to_str().unwrap_or_default(),
      "--output-dir",
      self.out.to_str().unwrap_or_default(),
    ];
    args.extend_from_slice(extra);
    args
  }
}

/// Run git in `cwd` with a fixed identity and no user or system config,
/// returning stdout
pub fn git(cwd: &Path, args: &[&str]) -> Result<String> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .env("GIT_CONFIG_GLOBAL", "/dev/null")
    .env("GIT_CONFIG_NOSYSTEM", "1")
    .env("GIT_AUTHOR_NAME", "Firmware Tester")
    .env("GIT_AUTHOR_EMAIL", "firmware@example.com")
    .env("GIT_COMMITTER_NAME", "Firmware Tester")
    .env("GIT_COMMITTER_EMAIL", "firmware@example.com")
    .output()
    .with_context(|| format!("Failed to spawn git {}", args.join(" ")))?;

  anyhow::ensure!(
    output.status.success(),
    "git {} exited with {}: {}",
    args.join(" "),
    output.status,
    String::from_utf8_lossy(&output.stderr).trim()
  );

  Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn fw_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_fw-release"))
    .current_dir(cwd)
    .args(args)
    .env_remove("GITHUB_TOKEN")
    .env_remove("GH_REPO_TOKEN")
    .env_remove("TRAVIS_REPO_SLUG")
    .env_remove("TRAVIS_TAG")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run fw-release")
}

/// Run fw-release, failing the test when it exits non-zero
pub fn run_fw_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = fw_release(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "fw-release command failed: fw-release {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run fw-release, failing the test when it succeeds
pub fn run_fw_release_failure(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = fw_release(cwd, args)?;

  if output.status.success() {
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!("fw-release {} unexpectedly succeeded\nstdout: {}", args.join(" "), stdout);
  }

  Ok(output)
}
