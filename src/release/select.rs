//! Release and build image selection
//!
//! Build images follow the naming convention
//! `<target><build-suffix>.<ext>` or `<target><build-suffix>_<subtype>.<ext>`,
//! where the build suffix usually reads `-<version>-<time>-<user>-<hash>`.

use crate::core::config::{ProjectConfig, Release};
use crate::core::context::ProjectContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, SelectionError};
use crate::core::prompt::{Prompt, choose_index};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

/// How to pick one build among the candidates of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildChoice {
  /// Lexicographically greatest build name
  Latest,
  /// Exact build name
  Named(String),
  /// Ask for an index
  Prompt,
}

impl BuildChoice {
  /// Interpret the `--build` argument
  pub fn from_arg(arg: Option<&str>) -> Self {
    match arg {
      None | Some("") => BuildChoice::Prompt,
      Some("latest") => BuildChoice::Latest,
      Some(name) => BuildChoice::Named(name.to_string()),
    }
  }
}

/// Pick the release to build
///
/// An explicit name wins; a single configured release is picked
/// automatically; otherwise the user is asked for an index.
pub fn select_release(config: &ProjectConfig, name: Option<&str>, prompt: &mut dyn Prompt) -> ReleaseResult<Release> {
  let names = config.release_names();

  println!("\nAvailable Releases:");
  for (idx, val) in names.iter().enumerate() {
    println!("    {}: {}", idx, val);
  }

  let chosen = match name.filter(|n| !n.is_empty()) {
    Some(name) => {
      println!("\nUsing command line arg release: {}", name);
      name.to_string()
    }
    None if names.len() == 1 => {
      println!("\nAuto selecting release: {}", names[0]);
      names[0].clone()
    }
    None if names.is_empty() => {
      return Err(
        SelectionError::NoCandidates {
          what: "releases in releases.yaml".to_string(),
        }
        .into(),
      );
    }
    None => {
      let idx = choose_index(prompt, "release", "\nEnter index of release to generate: ", names.len())?;
      names[idx].clone()
    }
  };

  config.release(&chosen)
}

/// Derive the build name from an image file name
///
/// Returns `None` when the file does not belong to `target`. The part after
/// the target name is cut at the first `_` when there is one, otherwise at
/// the first `.`.
pub fn build_name(target: &str, file_name: &str) -> Option<String> {
  let rest = file_name.strip_prefix(target)?;

  let suffix = match rest.split_once('_') {
    Some((head, _)) => head,
    None => rest.split('.').next().unwrap_or(rest),
  };

  Some(format!("{}{}", target, suffix))
}

/// Patterns matching the image files of one build
///
/// `<build>.<ext>` or `<build>_<c><word chars>.<ext>` for each extension.
pub fn image_patterns(build: &str, extensions: &[String]) -> ReleaseResult<Vec<Regex>> {
  let build = regex::escape(build);
  let mut patterns = Vec::with_capacity(extensions.len() * 2);

  for ext in extensions {
    patterns.push(Regex::new(&format!(r"^{}\.{}$", build, regex::escape(ext)))?);
  }
  for ext in extensions {
    patterns.push(Regex::new(&format!(r"^{}_.\w*\.{}$", build, regex::escape(ext)))?);
  }

  Ok(patterns)
}

/// Select the image files of one build per release target
///
/// The same choice applies to every target of the release. Files are
/// returned in target order, then file-name order, each at most once.
pub fn select_build_images(
  ctx: &ProjectContext,
  release: &Release,
  choice: &BuildChoice,
  prompt: &mut dyn Prompt,
) -> ReleaseResult<Vec<PathBuf>> {
  let mut images = Vec::new();

  for target_name in &release.targets {
    let target = ctx.config.target(target_name)?;
    let image_dir = ctx.resolve(&target.image_dir);
    let files = list_files(&image_dir)?;

    println!("\n🔍 Finding builds for target {}:", target.name);

    let builds: Vec<String> = files
      .iter()
      .filter_map(|f| build_name(&target.name, f))
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    for (idx, val) in builds.iter().enumerate() {
      println!("    {}: {}", idx, val);
    }

    let build = match choice {
      BuildChoice::Latest => {
        let latest = builds.last().cloned().ok_or_else(|| no_builds(&target.name))?;
        println!("\nAuto selecting latest build: {}", latest);
        latest
      }
      BuildChoice::Named(name) => {
        println!("\nUsing command line arg build: {}", name);
        if !builds.contains(name) {
          return Err(
            SelectionError::UnknownName {
              what: "build".to_string(),
              name: name.clone(),
              available: builds,
            }
            .into(),
          );
        }
        name.clone()
      }
      BuildChoice::Prompt => {
        if builds.is_empty() {
          return Err(no_builds(&target.name));
        }
        let question = format!("\nEnter index of build to include for target {}: ", target.name);
        let idx = choose_index(prompt, "build", &question, builds.len())?;
        builds[idx].clone()
      }
    };

    let patterns = image_patterns(&build, &target.extensions)?;

    println!("\n🔍 Finding images for target {}, build {}...", target.name, build);
    for file in &files {
      if patterns.iter().any(|p| p.is_match(file)) {
        println!("    Found: {}", file);
        images.push(image_dir.join(file));
      }
    }
  }

  Ok(images)
}

/// Sorted names of the regular files in a directory
fn list_files(dir: &std::path::Path) -> ReleaseResult<Vec<String>> {
  let entries = fs::read_dir(dir).with_context(|| format!("Failed to read image directory {}", dir.display()))?;

  let mut files = Vec::new();
  for entry in entries {
    let entry = entry?;
    if entry.file_type()?.is_file()
      && let Some(name) = entry.file_name().to_str()
    {
      files.push(name.to_string());
    }
  }

  files.sort();
  Ok(files)
}

fn no_builds(target: &str) -> ReleaseError {
  SelectionError::NoCandidates {
    what: format!("builds for target {}", target),
  }
  .into()
}
