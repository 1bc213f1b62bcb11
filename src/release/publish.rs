//! Tag and publish a release
//!
//! One attempt moves through [`PublishStage`]:
//!
//! ```text
//! Idle -> Validated -> Tagged -> NotesGenerated -> Published
//!                        |
//!                        +--(notes failed)--> Idle   (tag deleted locally and on origin)
//! ```
//!
//! Local checks run before any request to the hosting service. Asset upload
//! failures are not rolled back: the error lists what is already attached.

use crate::core::error::{ReleaseError, ReleaseResult, RemoteError, RepositoryError, TagLocation};
use crate::core::vcs::SystemGit;
use crate::release::notes;
use crate::release::version::{ReleaseType, parse_release_tag};
use crate::remote::{NewRelease, RemoteHost, RemoteRelease};
use crate::ui::progress::StepProgress;
use std::path::PathBuf;

/// Remote the release tag is pushed to
pub const REMOTE: &str = "origin";

/// Appended to every release body
pub const TRAILER: &str = "\n\nRelease generated with fw-release\n";

/// Body used when there is no previous release to diff against
pub const NO_NOTES: &str = "No release notes";

/// Tag names and message for one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan {
  pub new_tag: String,
  /// `None` for a first release
  pub old_tag: Option<String>,
  /// Annotated tag message, also the release title
  pub message: String,
  pub release_type: ReleaseType,
}

impl TagPlan {
  /// Primary releases tag `<version>`; others namespace the tag as
  /// `<release>_<version>`. The previous tag follows the same scheme and is
  /// absent when `previous` is empty.
  pub fn new(release_name: &str, primary: bool, version: &str, previous: &str) -> ReleaseResult<Self> {
    let release_type = ReleaseType::classify(version)?;
    let previous = previous.trim();

    let (new_tag, old_tag, message) = if primary {
      (
        version.to_string(),
        (!previous.is_empty()).then(|| previous.to_string()),
        format!("{} Release {}", release_type, version),
      )
    } else {
      (
        format!("{}_{}", release_name, version),
        (!previous.is_empty()).then(|| format!("{}_{}", release_name, previous)),
        format!("{} {} Release {}", release_name, release_type, version),
      )
    };

    Ok(Self {
      new_tag,
      old_tag,
      message,
      release_type,
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
  Idle,
  Validated,
  Tagged,
  NotesGenerated,
  Published,
}

/// Drives one release attempt against a checkout and a hosting service
pub struct Publisher<'a> {
  git: &'a SystemGit,
  org: String,
  stage: PublishStage,
}

impl<'a> Publisher<'a> {
  pub fn new(git: &'a SystemGit, org: &str) -> Self {
    Self {
      git,
      org: org.to_string(),
      stage: PublishStage::Idle,
    }
  }

  pub fn stage(&self) -> PublishStage {
    self.stage
  }

  pub fn git(&self) -> &'a SystemGit {
    self.git
  }

  /// Local preconditions: clean tracked files, previous tag present, new tag absent
  pub fn validate(&mut self, plan: &TagPlan) -> ReleaseResult<()> {
    if self.git.is_dirty()? {
      return Err(
        RepositoryError::Dirty {
          path: self.git.work_tree().to_path_buf(),
        }
        .into(),
      );
    }

    let tags = self.git.list_tags()?;
    check_tags(plan, &tags, TagLocation::Local)?;

    self.stage = PublishStage::Validated;
    Ok(())
  }

  /// Tag, generate notes, create the release and attach `attachments` in order
  pub fn publish(
    &mut self,
    host: &dyn RemoteHost,
    plan: &TagPlan,
    attachments: &[PathBuf],
  ) -> ReleaseResult<RemoteRelease> {
    if self.stage != PublishStage::Validated {
      self.validate(plan)?;
    }

    let remote_tags = host.tags()?;
    check_tags(plan, &remote_tags, TagLocation::Remote)?;

    println!("🏷️  Creating tag {} ({} release)", plan.new_tag, plan.release_type);
    self.git.create_annotated_tag(&plan.new_tag, &plan.message)?;
    if let Err(e) = self.git.push_tag(REMOTE, &plan.new_tag) {
      self.stage = PublishStage::Idle;
      return Err(match self.git.delete_tag(&plan.new_tag) {
        Ok(()) => e,
        Err(cleanup) => e.context(format!(
          "Failed to delete local tag {} after push error ({}). Remove it by hand.",
          plan.new_tag, cleanup
        )),
      });
    }
    self.stage = PublishStage::Tagged;

    let body = match self.release_notes(host, plan) {
      Ok(md) => md,
      Err(e) => return Err(self.rollback(plan, e)),
    };
    self.stage = PublishStage::NotesGenerated;

    println!("📤 Creating release {}", plan.message);
    let release = host.create_release(&NewRelease {
      tag_name: plan.new_tag.clone(),
      name: plan.message.clone(),
      body: format!("{}{}", body, TRAILER),
      draft: false,
    })?;

    upload_all(host, &release, attachments)?;
    self.stage = PublishStage::Published;

    println!("✅ Released {}", release.html_url);
    Ok(release)
  }

  fn release_notes(&self, host: &dyn RemoteHost, plan: &TagPlan) -> ReleaseResult<String> {
    match &plan.old_tag {
      Some(old) => {
        println!("📝 Generating release notes {}...{}", old, plan.new_tag);
        notes::generate(self.git, host, old, &plan.new_tag, &self.org)
      }
      None => Ok(NO_NOTES.to_string()),
    }
  }

  /// Remove the tag locally and on the remote, then wrap `cause`
  fn rollback(&mut self, plan: &TagPlan, cause: ReleaseError) -> ReleaseError {
    tracing::debug!(tag = %plan.new_tag, "rolling back release tag");

    let cleanup = self
      .git
      .delete_tag(&plan.new_tag)
      .and_then(|_| self.git.delete_remote_tag(REMOTE, &plan.new_tag));

    match cleanup {
      Ok(()) => {
        self.stage = PublishStage::Idle;
        cause.context(format!("Deleted tag {} due to error:", plan.new_tag))
      }
      Err(e) => cause.context(format!(
        "Failed to delete tag {} after error ({}). Remove it by hand.",
        plan.new_tag, e
      )),
    }
  }
}

/// Release an existing, already pushed tag
///
/// The tag must be a `v?N.N.N` release version present in the checkout.
/// Notes are generated from the nearest earlier tag, or are `No release notes`
/// when history holds none; the release is named `<Type> Release <tag>`.
pub fn publish_existing_tag(git: &SystemGit, host: &dyn RemoteHost, tag: &str, org: &str) -> ReleaseResult<RemoteRelease> {
  parse_release_tag(tag)?;
  let release_type = ReleaseType::classify(tag)?;

  if !git.has_tag(tag)? {
    return Err(RepositoryError::ReleaseTagMissing { tag: tag.to_string() }.into());
  }
  let previous = git.previous_tag(tag)?;

  if host.find_release(tag)?.is_some() {
    return Err(RepositoryError::ReleaseExists { tag: tag.to_string() }.into());
  }

  let body = match previous {
    Some(old) => {
      println!("📝 Generating release notes {}...{}", old, tag);
      notes::generate(git, host, &old, tag, org)?
    }
    None => NO_NOTES.to_string(),
  };

  let release = host.create_release(&NewRelease {
    tag_name: tag.to_string(),
    name: format!("{} Release {}", release_type, tag),
    body,
    draft: false,
  })?;

  println!("✅ Released {}", release.html_url);
  Ok(release)
}

fn check_tags(plan: &TagPlan, tags: &[String], location: TagLocation) -> ReleaseResult<()> {
  if let Some(old) = &plan.old_tag
    && !tags.iter().any(|t| t == old)
  {
    return Err(
      RepositoryError::TagMissing {
        tag: old.clone(),
        location,
      }
      .into(),
    );
  }

  if tags.iter().any(|t| *t == plan.new_tag) {
    return Err(
      RepositoryError::TagExists {
        tag: plan.new_tag.clone(),
        location,
      }
      .into(),
    );
  }

  Ok(())
}

fn upload_all(host: &dyn RemoteHost, release: &RemoteRelease, attachments: &[PathBuf]) -> ReleaseResult<()> {
  let mut uploaded = Vec::with_capacity(attachments.len());
  let mut progress = StepProgress::new(attachments.len(), "Uploading");

  for path in attachments {
    match host.upload_asset(release, path) {
      Ok(asset) => {
        progress.step(&asset.name);
        uploaded.push(asset.name);
      }
      Err(e) => {
        return Err(
          RemoteError::UploadFailed {
            asset: path.clone(),
            release_url: release.html_url.clone(),
            uploaded,
            reason: e.to_string(),
          }
          .into(),
        );
      }
    }
  }

  tracing::debug!(count = progress.done(), "assets attached");
  Ok(())
}
