//! CPSW source bundle (gzip tarball of hardware description files)

use crate::core::config::{PackageKind, Release};
use crate::core::context::ProjectContext;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::files::select_directories;
use crate::release::package::archive_name;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Build the CPSW tarball for a release into `out_dir`
///
/// Only file entries are stored; directories are implied by member paths.
/// Members live under `<release>_project.yaml/`, config files under its
/// `config/` folder.
pub fn build_cpsw_bundle(ctx: &ProjectContext, release: &Release, version: &str, out_dir: &Path) -> ReleaseResult<PathBuf> {
  println!("\n🔍 Finding CPSW Files...");
  let sources = select_directories(&ctx.project_dir, &ctx.config.cpsw_source)?;
  let config = select_directories(&ctx.project_dir, &ctx.config.cpsw_config)?;

  if sources.is_empty() {
    return Err(ReleaseError::Config(ConfigError::EmptyList {
      what: "Cpsw packages".to_string(),
    }));
  }

  let base = format!("{}_project.yaml", release.name);
  let archive = out_dir.join(archive_name(PackageKind::Cpsw, release, version));

  println!("\n📦 Creating CPSW tarfile {}", archive.display());

  let file = File::create(&archive).with_context(|| format!("Failed to create {}", archive.display()))?;
  let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));

  let members = sources
    .iter()
    .filter(|e| e.is_file())
    .map(|e| (e, format!("{}/{}", base, e.sub_path)))
    .chain(
      config
        .iter()
        .filter(|e| e.is_file())
        .map(|e| (e, format!("{}/config/{}", base, e.sub_path))),
    );

  let result = (|| -> ReleaseResult<()> {
    for (entry, dst) in members {
      tar
        .append_path_with_name(&entry.full_path, &dst)
        .with_context(|| format!("Failed to add {} to {}", entry.full_path.display(), archive.display()))?;
    }
    tar.into_inner()?.finish()?;
    Ok(())
  })();

  if let Err(e) = result {
    if let Err(rm) = fs::remove_file(&archive) {
      tracing::warn!(path = %archive.display(), "failed to remove partial archive: {}", rm);
    }
    return Err(e);
  }

  Ok(archive)
}
