//! Project context - load once, pass everywhere
//!
//! ```text
//! commands/release.rs:
//!   ProjectContext::load(--project) -> &ProjectContext
//!   |
//!   v
//! release::select, release::package, release::publish:
//!   fn op(ctx: &ProjectContext, ...)
//! ```

use crate::core::config::ProjectConfig;
use crate::core::error::{ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};

/// Immutable per-invocation state shared by every stage of a release
#[derive(Debug, Clone)]
pub struct ProjectContext {
  /// Firmware project directory (absolute path)
  pub project_dir: PathBuf,

  /// Parsed `releases.yaml`
  pub config: ProjectConfig,
}

impl ProjectContext {
  /// Build the context from a project directory
  pub fn load(project_dir: &Path) -> ReleaseResult<Self> {
    let project_dir = std::path::absolute(project_dir)
      .with_context(|| format!("Failed to resolve project directory {}", project_dir.display()))?;
    let config = ProjectConfig::load(&project_dir)?;

    Ok(Self { project_dir, config })
  }

  /// Resolve a path from the configuration against the project directory
  pub fn resolve(&self, path: &Path) -> PathBuf {
    self.project_dir.join(path)
  }

  /// Git checkout holding the firmware sources
  pub fn git_dir(&self) -> PathBuf {
    self.resolve(&self.config.git_base)
  }
}
