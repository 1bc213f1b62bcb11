//! `release`: package a firmware release and optionally publish it

use super::{connect_origin, resolve_token};
use crate::core::config::{PackageKind, Release};
use crate::core::context::ProjectContext;
use crate::core::error::ReleaseResult;
use crate::core::prompt::{Prompt, Resolver};
use crate::core::vcs::SystemGit;
use crate::release::bundle::build_cpsw_bundle;
use crate::release::package::build_rogue_package;
use crate::release::publish::{Publisher, TagPlan};
use crate::release::select::{BuildChoice, select_build_images, select_release};
use crate::release::version::ReleaseType;
use crate::utils::{file_name, sha256_file};
use std::path::{Path, PathBuf};

/// Command-line values for one `release` run
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
  pub project: PathBuf,
  pub release: Option<String>,
  pub build: Option<String>,
  pub version: Option<String>,
  pub prev: Option<String>,
  pub token: Option<String>,
  /// Where archives are written; current directory when unset
  pub output_dir: Option<PathBuf>,
  pub push: bool,
}

pub fn run_release(opts: ReleaseOptions, prompt: &mut dyn Prompt) -> ReleaseResult<()> {
  let ctx = ProjectContext::load(&opts.project)?;

  let requested = opts.release.as_deref().filter(|r| !r.is_empty());
  let release = select_release(&ctx.config, requested, prompt)?;
  let images = select_build_images(&ctx, &release, &BuildChoice::from_arg(opts.build.as_deref()), prompt)?;

  let version = Resolver::new("version")
    .explicit(opts.version)
    .interactive("\nEnter version for release (i.e. v1.2.3): ")
    .require(prompt)?;
  ReleaseType::classify(&version)?;

  let prev = if opts.push {
    Resolver::new("previous version")
      .explicit(opts.prev)
      .interactive("\nEnter previous version for compare (i.e. v1.2.3) or enter for none: ")
      .resolve(prompt)?
      .unwrap_or_default()
  } else {
    String::new()
  };

  println!("\nUsing version {} and previous version {}\n", version, prev);

  // Tag checks against the local checkout happen before anything is built
  let git = if opts.push {
    Some(SystemGit::open(&ctx.git_dir())?)
  } else {
    None
  };
  let mut staged = match &git {
    Some(git) => {
      println!("GitDir = {}", git.work_tree().display());
      let plan = TagPlan::new(&release.name, release.primary, &version, &prev)?;
      let mut publisher = Publisher::new(git, &ctx.config.github_org);
      publisher.validate(&plan)?;
      Some((publisher, plan))
    }
    None => None,
  };

  print_summary(&release, &version, &images);

  let out_dir = match opts.output_dir {
    Some(dir) => dir,
    None => std::env::current_dir()?,
  };
  std::fs::create_dir_all(&out_dir)?;

  let attachments = build_attachments(&ctx, &release, &version, images, &out_dir)?;

  println!("\n📎 Attachments:");
  for path in &attachments {
    println!("   {}  {}", sha256_file(path)?, file_name(path)?);
  }

  if let Some((publisher, plan)) = staged.as_mut() {
    let token = resolve_token(opts.token, prompt)?;
    let host = connect_origin(publisher.git(), &ctx.config.github_org, &token)?;
    publisher.publish(&host, plan, &attachments)?;
  } else {
    println!("\n✅ Release {} {} packaged (not pushed)", release.name, version);
  }

  Ok(())
}

fn print_summary(release: &Release, version: &str, images: &[PathBuf]) {
  println!("Release = {}", release.name);
  println!("Version = {}", version);
  println!("Images  = ");
  for image in images {
    println!("\t{}", image.display());
  }
}

/// Selected images followed by the generated archives
fn build_attachments(
  ctx: &ProjectContext,
  release: &Release,
  version: &str,
  images: Vec<PathBuf>,
  out_dir: &Path,
) -> ReleaseResult<Vec<PathBuf>> {
  let mut attachments = images.clone();

  if release.produces(PackageKind::Rogue) {
    let manifest = build_rogue_package(ctx, release, version, &images, out_dir)?;
    println!(
      "   {} members, packages: {}",
      manifest.members.len(),
      manifest.packages.join(", ")
    );
    attachments.push(manifest.archive);
  }

  if release.produces(PackageKind::Cpsw) {
    attachments.push(build_cpsw_bundle(ctx, release, version, out_dir)?);
  }

  Ok(attachments)
}
