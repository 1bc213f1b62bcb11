//! Temporary git repository with a bare `origin` for unit tests

use super::SystemGit;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct TestRepo {
  _temp: TempDir,
  work: PathBuf,
  origin: PathBuf,
}

impl TestRepo {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work");
    let origin = temp.path().join("origin.git");
    std::fs::create_dir_all(&work).unwrap();

    git(temp.path(), &["init", "--bare", "-q", "origin.git"]);
    git(&work, &["init", "-q", "-b", "main"]);
    git(&work, &["config", "user.name", "Test User"]);
    git(&work, &["config", "user.email", "test@example.com"]);
    git(&work, &["config", "commit.gpgsign", "false"]);
    git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);

    let repo = Self {
      _temp: temp,
      work,
      origin,
    };
    repo.commit("Initial commit", "README.md");
    git(&repo.work, &["push", "-q", "origin", "main"]);
    repo
  }

  pub fn path(&self) -> &Path {
    &self.work
  }

  pub fn git(&self) -> SystemGit {
    SystemGit::open(&self.work).unwrap()
  }

  /// Write `file` and commit it with `message`
  pub fn commit(&self, message: &str, file: &str) {
    std::fs::write(self.work.join(file), message).unwrap();
    git(&self.work, &["add", file]);
    git(&self.work, &["commit", "-q", "-m", message]);
  }

  pub fn origin_path(&self) -> PathBuf {
    self.origin.clone()
  }

  pub fn origin_tags(&self) -> Vec<String> {
    let output = Command::new("git")
      .arg("-C")
      .arg(&self.origin)
      .args(["tag", "--list"])
      .output()
      .unwrap();
    String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(|s| s.to_string())
      .collect()
  }
}

fn git(dir: &Path, args: &[&str]) {
  let status = Command::new("git").arg("-C").arg(dir).args(args).status().unwrap();
  assert!(status.success(), "git {:?} failed", args);
}
