//! Project release configuration (`releases.yaml`)
//!
//! The file is parsed into raw structs where every key is optional, then
//! checked key by key so that a missing entry is reported by name. Release
//! and target entries are validated lazily, when a command actually uses
//! them, so an incomplete target that no release references never blocks a
//! release.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the project directory
pub const CONFIG_FILE: &str = "releases.yaml";

/// Organisation used when `GitHubOrg` is not set
pub const DEFAULT_GITHUB_ORG: &str = "slaclab";

/// A YAML value that may be written as a scalar or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  fn into_vec(self) -> Vec<T> {
    match self {
      OneOrMany::One(v) => vec![v],
      OneOrMany::Many(v) => v,
    }
  }
}

fn list<T>(value: Option<OneOrMany<T>>) -> Vec<T> {
  value.map(OneOrMany::into_vec).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawConfig {
  git_base: Option<PathBuf>,
  releases: Option<IndexMap<String, ReleaseSpec>>,
  targets: Option<IndexMap<String, TargetSpec>>,
  top_rogue_package: Option<String>,
  rogue_packages: Option<OneOrMany<PathBuf>>,
  rogue_config: Option<OneOrMany<PathBuf>>,
  cpsw_source: Option<OneOrMany<PathBuf>>,
  cpsw_config: Option<OneOrMany<PathBuf>>,
  rogue_scripts: Option<OneOrMany<PathBuf>>,
  conda_dependencies: Option<OneOrMany<String>>,
  #[serde(rename = "GitHubOrg")]
  github_org: Option<String>,
}

/// One entry under `Releases`, as written
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseSpec {
  targets: Option<Vec<String>>,
  types: Option<Vec<PackageKind>>,
  primary: Option<bool>,
  lib_dir: Option<OneOrMany<PathBuf>>,
}

/// One entry under `Targets`, as written
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetSpec {
  image_dir: Option<PathBuf>,
  extensions: Option<Vec<String>>,
}

/// Package kinds a release can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PackageKind {
  /// Python-installable zip
  Rogue,
  /// Hardware description source tarball
  #[serde(rename = "CPSW")]
  Cpsw,
}

impl fmt::Display for PackageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackageKind::Rogue => write!(f, "Rogue"),
      PackageKind::Cpsw => write!(f, "CPSW"),
    }
  }
}

/// Validated release definition
#[derive(Debug, Clone)]
pub struct Release {
  pub name: String,
  pub targets: Vec<String>,
  pub types: Vec<PackageKind>,
  pub primary: bool,
  /// Native library sources; `Some` when the release declares `LibDir`
  pub lib_dir: Option<Vec<PathBuf>>,
}

impl Release {
  pub fn produces(&self, kind: PackageKind) -> bool {
    self.types.contains(&kind)
  }

  pub fn has_library(&self) -> bool {
    self.lib_dir.is_some()
  }
}

/// Validated build target
#[derive(Debug, Clone)]
pub struct Target {
  pub name: String,
  pub image_dir: PathBuf,
  pub extensions: Vec<String>,
}

/// Project-level release configuration
#[derive(Debug, Clone)]
pub struct ProjectConfig {
  pub git_base: PathBuf,
  pub releases: IndexMap<String, ReleaseSpec>,
  pub targets: IndexMap<String, TargetSpec>,
  pub top_rogue_package: Option<String>,
  pub rogue_packages: Vec<PathBuf>,
  pub rogue_config: Vec<PathBuf>,
  pub cpsw_source: Vec<PathBuf>,
  pub cpsw_config: Vec<PathBuf>,
  pub rogue_scripts: Vec<PathBuf>,
  pub conda_dependencies: Vec<String>,
  pub github_org: String,
}

impl ProjectConfig {
  /// Load `releases.yaml` from a project directory
  pub fn load(project_dir: &Path) -> ReleaseResult<Self> {
    let path = project_dir.join(CONFIG_FILE);

    if !path.is_file() {
      return Err(ReleaseError::Config(ConfigError::NotFound { path }));
    }

    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::parse(&content).with_context(|| format!("Failed to load project release file {}", path.display()))
  }

  /// Parse and validate configuration text
  pub fn parse(content: &str) -> ReleaseResult<Self> {
    let raw: RawConfig = serde_yaml::from_str(content)?;

    let git_base = raw.git_base.ok_or_else(|| missing("GitBase key"))?;
    let releases = raw.releases.ok_or_else(|| missing("Releases key"))?;
    let targets = raw.targets.ok_or_else(|| missing("Targets key"))?;

    Ok(Self {
      git_base,
      releases,
      targets,
      top_rogue_package: raw.top_rogue_package,
      rogue_packages: list(raw.rogue_packages),
      rogue_config: list(raw.rogue_config),
      cpsw_source: list(raw.cpsw_source),
      cpsw_config: list(raw.cpsw_config),
      rogue_scripts: list(raw.rogue_scripts),
      conda_dependencies: list(raw.conda_dependencies),
      github_org: raw.github_org.unwrap_or_else(|| DEFAULT_GITHUB_ORG.to_string()),
    })
  }

  /// Release names in file order
  pub fn release_names(&self) -> Vec<String> {
    self.releases.keys().cloned().collect()
  }

  /// Validate and return a release by name
  pub fn release(&self, name: &str) -> ReleaseResult<Release> {
    let spec = self.releases.get(name).ok_or_else(|| {
      ReleaseError::from(crate::core::error::SelectionError::UnknownName {
        what: "release".to_string(),
        name: name.to_string(),
        available: self.release_names(),
      })
    })?;

    if name.contains('-') {
      return Err(ReleaseError::Config(ConfigError::InvalidReleaseName {
        name: name.to_string(),
      }));
    }

    let targets = spec
      .targets
      .clone()
      .filter(|t| !t.is_empty())
      .ok_or_else(|| missing(format!("Targets list in release {}", name)))?;

    let types = spec
      .types
      .clone()
      .filter(|t| !t.is_empty())
      .ok_or_else(|| missing(format!("Types list in release {}", name)))?;

    Ok(Release {
      name: name.to_string(),
      targets,
      types,
      primary: spec.primary.unwrap_or(false),
      lib_dir: spec.lib_dir.clone().map(OneOrMany::into_vec),
    })
  }

  /// Validate and return a target by name
  pub fn target(&self, name: &str) -> ReleaseResult<Target> {
    let spec = self.targets.get(name).ok_or_else(|| {
      ReleaseError::Config(ConfigError::UndeclaredTarget {
        target: name.to_string(),
      })
    })?;

    let image_dir = spec
      .image_dir
      .clone()
      .ok_or_else(|| missing(format!("ImageDir for target {}", name)))?;

    let extensions = spec
      .extensions
      .clone()
      .filter(|e| !e.is_empty())
      .ok_or_else(|| missing(format!("Extensions list for target {}", name)))?;

    Ok(Target {
      name: name.to_string(),
      image_dir,
      extensions,
    })
  }

  /// Top package name, required for Rogue packages
  pub fn require_top_package(&self) -> ReleaseResult<&str> {
    self
      .top_rogue_package
      .as_deref()
      .filter(|s| !s.is_empty())
      .ok_or_else(|| missing("TopRoguePackage"))
  }
}

fn missing(field: impl Into<String>) -> ReleaseError {
  ReleaseError::Config(ConfigError::MissingField { field: field.into() })
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
GitBase: ..
TopRoguePackage: demo_pkg
RoguePackages:
  - python
RogueConfig: config
RogueScripts:
  - scripts/run.py
CondaDependencies:
  - rogue>=6.0
  - numpy
Targets:
  fpgaA:
    ImageDir: targets/fpgaA/images
    Extensions:
      - bit
      - mcs
  fpgaB:
    ImageDir: targets/fpgaB/images
Releases:
  demo:
    Primary: True
    Targets:
      - fpgaA
    Types:
      - Rogue
  extra_lib:
    Targets: [fpgaA, fpgaB]
    Types: [Rogue, CPSW]
    LibDir: lib
  bad-name:
    Targets: [fpgaA]
    Types: [Rogue]
"#;

  #[test]
  fn test_parse_sample() {
    let cfg = ProjectConfig::parse(SAMPLE).unwrap();
    assert_eq!(cfg.git_base, PathBuf::from(".."));
    assert_eq!(cfg.release_names(), vec!["demo", "extra_lib", "bad-name"]);
    assert_eq!(cfg.rogue_config, vec![PathBuf::from("config")]);
    assert_eq!(cfg.conda_dependencies.len(), 2);
    assert_eq!(cfg.github_org, "slaclab");
  }

  #[test]
  fn test_missing_required_key_is_named() {
    let err = ProjectConfig::parse("Releases: {}\nTargets: {}\n").unwrap_err();
    assert!(err.to_string().contains("GitBase key is missing or empty"));

    let err = ProjectConfig::parse("GitBase: ..\nReleases:\nTargets: {}\n").unwrap_err();
    assert!(err.to_string().contains("Releases key"));
  }

  #[test]
  fn test_release_defaults_and_library() {
    let cfg = ProjectConfig::parse(SAMPLE).unwrap();

    let demo = cfg.release("demo").unwrap();
    assert!(demo.primary);
    assert!(!demo.has_library());
    assert!(demo.produces(PackageKind::Rogue));
    assert!(!demo.produces(PackageKind::Cpsw));

    let extra = cfg.release("extra_lib").unwrap();
    assert!(!extra.primary);
    assert_eq!(extra.lib_dir, Some(vec![PathBuf::from("lib")]));
    assert!(extra.produces(PackageKind::Cpsw));
  }

  #[test]
  fn test_hyphenated_release_name_rejected() {
    let cfg = ProjectConfig::parse(SAMPLE).unwrap();
    let err = cfg.release("bad-name").unwrap_err();
    assert!(matches!(err, ReleaseError::Config(ConfigError::InvalidReleaseName { .. })));
  }

  #[test]
  fn test_target_validation() {
    let cfg = ProjectConfig::parse(SAMPLE).unwrap();

    let a = cfg.target("fpgaA").unwrap();
    assert_eq!(a.extensions, vec!["bit", "mcs"]);

    let err = cfg.target("fpgaB").unwrap_err();
    assert!(err.to_string().contains("Extensions list for target fpgaB"));

    let err = cfg.target("fpgaC").unwrap_err();
    assert!(matches!(err, ReleaseError::Config(ConfigError::UndeclaredTarget { .. })));
  }

  #[test]
  fn test_custom_org() {
    let cfg = ProjectConfig::parse("GitBase: .\nReleases: {}\nTargets: {}\nGitHubOrg: acme\n").unwrap();
    assert_eq!(cfg.github_org, "acme");
    assert!(cfg.require_top_package().is_err());
  }
}
