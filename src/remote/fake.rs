//! In-memory RemoteHost for unit tests

use super::{NewRelease, PullRequest, ReleaseAsset, RemoteHost, RemoteRelease};
use crate::core::error::{ReleaseResult, RemoteError};
use crate::utils::file_name;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Default)]
pub struct FakeHost {
  pub pulls: HashMap<u64, PullRequest>,
  pub comments: HashMap<u64, Vec<String>>,
  /// Tags are read from this bare repository when set
  pub origin: Option<PathBuf>,
  pub extra_tags: Vec<String>,
  /// Upload of an asset with this file name fails
  pub fail_upload: Option<String>,
  pub releases: RefCell<Vec<(NewRelease, Vec<String>)>>,
  pub calls: RefCell<Vec<String>>,
}

impl FakeHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_origin(origin: &Path) -> Self {
    Self {
      origin: Some(origin.to_path_buf()),
      ..Self::default()
    }
  }

  pub fn add_pull(&mut self, number: u64, title: &str, body: &str, labels: &[&str]) -> &mut PullRequest {
    let pr = PullRequest {
      number,
      title: title.to_string(),
      body: Some(body.to_string()),
      additions: number * 10,
      deletions: number,
      changed_files: 1,
      base: super::BranchRef {
        label: "slaclab:main".to_string(),
      },
      head: super::BranchRef {
        label: format!("slaclab:branch-{}", number),
      },
      labels: labels
        .iter()
        .map(|l| super::Label { name: l.to_string() })
        .collect(),
    };
    self.pulls.insert(number, pr);
    self.pulls.get_mut(&number).unwrap()
  }

  fn record(&self, call: String) {
    self.calls.borrow_mut().push(call);
  }
}

impl RemoteHost for FakeHost {
  fn full_name(&self) -> &str {
    "slaclab/demo"
  }

  fn tags(&self) -> ReleaseResult<Vec<String>> {
    self.record("tags".to_string());
    let mut tags = self.extra_tags.clone();
    if let Some(origin) = &self.origin {
      let output = Command::new("git").arg("-C").arg(origin).args(["tag", "--list"]).output()?;
      tags.extend(String::from_utf8_lossy(&output.stdout).lines().map(|s| s.to_string()));
    }
    Ok(tags)
  }

  fn pull_request(&self, number: u64) -> ReleaseResult<PullRequest> {
    self.record(format!("pull {}", number));
    self.pulls.get(&number).cloned().ok_or_else(|| {
      RemoteError::Status {
        url: format!("fake/pulls/{}", number),
        status: 404,
      }
      .into()
    })
  }

  fn issue_comments(&self, number: u64) -> ReleaseResult<Vec<String>> {
    self.record(format!("comments {}", number));
    Ok(self.comments.get(&number).cloned().unwrap_or_default())
  }

  fn find_release(&self, tag: &str) -> ReleaseResult<Option<RemoteRelease>> {
    self.record(format!("find_release {}", tag));
    let releases = self.releases.borrow();
    Ok(releases.iter().position(|(r, _)| r.tag_name == tag).map(|idx| {
      let mut release = fake_release(idx as u64, tag);
      release.assets = releases[idx]
        .1
        .iter()
        .map(|name| ReleaseAsset {
          id: 1,
          name: name.clone(),
          url: format!("fake/assets/{}", name),
          size: 0,
        })
        .collect();
      release
    }))
  }

  fn create_release(&self, release: &NewRelease) -> ReleaseResult<RemoteRelease> {
    self.record(format!("create_release {}", release.tag_name));
    let mut releases = self.releases.borrow_mut();
    releases.push((release.clone(), Vec::new()));
    Ok(fake_release((releases.len() - 1) as u64, &release.tag_name))
  }

  fn upload_asset(&self, release: &RemoteRelease, path: &Path) -> ReleaseResult<ReleaseAsset> {
    let name = file_name(path)?;
    self.record(format!("upload {}", name));

    if self.fail_upload.as_deref() == Some(name.as_str()) {
      return Err(
        RemoteError::Status {
          url: release.upload_url.clone(),
          status: 502,
        }
        .into(),
      );
    }

    let size = std::fs::metadata(path)?.len();
    self.releases.borrow_mut()[release.id as usize].1.push(name.clone());
    Ok(ReleaseAsset {
      id: 1,
      url: format!("fake/assets/{}", name),
      name,
      size,
    })
  }

  fn download_asset(&self, asset: &ReleaseAsset, dest: &Path) -> ReleaseResult<u64> {
    self.record(format!("download {}", asset.name));
    std::fs::write(dest, asset.name.as_bytes())?;
    Ok(asset.name.len() as u64)
  }
}

fn fake_release(id: u64, tag: &str) -> RemoteRelease {
  RemoteRelease {
    id,
    tag_name: tag.to_string(),
    name: None,
    html_url: format!("https://github.com/slaclab/demo/releases/tag/{}", tag),
    upload_url: "fake/upload{?name,label}".to_string(),
    assets: Vec::new(),
  }
}
