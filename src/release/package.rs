//! Rogue package assembly
//!
//! The package is a zip archive laid out as an installable python source
//! distribution. Every member is stored uncompressed: the runtime imports
//! the top package straight out of the archive and its zip importer cannot
//! read compressed members.

use crate::core::config::{PackageKind, Release};
use crate::core::context::ProjectContext;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::files::{EntryKind, FileEntry, select_directories};
use crate::release::recipe::{self, RecipeInputs};
use crate::utils::file_name;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Permission bits for generated members
const GENERATED_MODE: u32 = 0o644;

/// Permission bits for generated shell scripts
const GENERATED_SCRIPT_MODE: u32 = 0o755;

/// Archive file name for a release package
///
/// Primary releases carry only the version; secondary releases add their
/// name so several releases of one project can sit side by side.
pub fn archive_name(kind: PackageKind, release: &Release, version: &str) -> String {
  let (prefix, ext) = match kind {
    PackageKind::Rogue => ("rogue", "zip"),
    PackageKind::Cpsw => ("cpsw", "tar.gz"),
  };

  if release.primary {
    format!("{}_{}.{}", prefix, version, ext)
  } else {
    format!("{}_{}_{}.{}", prefix, release.name, version, ext)
  }
}

/// Zip writer that stores each destination path at most once
pub struct ArchiveWriter {
  zip: ZipWriter<File>,
  written: HashSet<String>,
  members: Vec<String>,
}

impl ArchiveWriter {
  pub fn create(path: &Path) -> ReleaseResult<Self> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    Ok(Self {
      zip: ZipWriter::new(file),
      written: HashSet::new(),
      members: Vec::new(),
    })
  }

  fn options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
      .compression_method(CompressionMethod::Stored)
      .unix_permissions(mode)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.written.contains(name)
  }

  /// Record a destination; false when it was already written
  fn claim(&mut self, name: &str) -> bool {
    if !self.written.insert(name.to_string()) {
      tracing::warn!(member = name, "archive member already written, skipping");
      return false;
    }
    self.members.push(name.to_string());
    true
  }

  /// Copy a file from disk, keeping its permission bits
  pub fn add_file(&mut self, src: &Path, dst: &str) -> ReleaseResult<bool> {
    if !self.claim(dst) {
      return Ok(false);
    }

    let mut input = File::open(src).with_context(|| format!("Failed to open {}", src.display()))?;
    let mode = file_mode(&input.metadata()?);

    self.zip.start_file(dst, Self::options(mode))?;
    io::copy(&mut input, &mut self.zip).with_context(|| format!("Failed to add {} to archive", src.display()))?;
    Ok(true)
  }

  /// Add a directory member (`dst` without trailing slash)
  pub fn add_directory(&mut self, dst: &str) -> ReleaseResult<bool> {
    let name = format!("{}/", dst.trim_end_matches('/'));
    if !self.claim(&name) {
      return Ok(false);
    }

    self.zip.add_directory(name.as_str(), Self::options(0o755))?;
    Ok(true)
  }

  /// Add generated content
  pub fn add_bytes(&mut self, dst: &str, bytes: &[u8], mode: u32) -> ReleaseResult<bool> {
    if !self.claim(dst) {
      return Ok(false);
    }

    self.zip.start_file(dst, Self::options(mode))?;
    self.zip.write_all(bytes)?;
    Ok(true)
  }

  /// Add a collected entry as a file or directory member
  pub fn add_entry(&mut self, entry: &FileEntry, dst: &str) -> ReleaseResult<bool> {
    match entry.kind {
      EntryKind::Folder => self.add_directory(dst),
      EntryKind::File => self.add_file(&entry.full_path, dst),
    }
  }

  /// Write the central directory and return the member names in order
  pub fn finish(self) -> ReleaseResult<Vec<String>> {
    let mut file = self.zip.finish()?;
    file.flush()?;
    Ok(self.members)
  }
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
  use std::os::unix::fs::PermissionsExt;
  meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(meta: &fs::Metadata) -> u32 {
  if meta.permissions().readonly() { 0o444 } else { GENERATED_MODE }
}

/// Sources gathered from the configuration before any archive is opened
#[derive(Debug)]
struct RogueSources {
  top_package: String,
  packages: Vec<FileEntry>,
  config: Vec<FileEntry>,
  scripts: Vec<PathBuf>,
  library: Option<Vec<FileEntry>>,
  entry_point: PathBuf,
  license: PathBuf,
}

impl RogueSources {
  fn collect(ctx: &ProjectContext, release: &Release) -> ReleaseResult<Self> {
    let cfg = &ctx.config;

    println!("\n🔍 Finding Rogue Files...");
    let packages = select_directories(&ctx.project_dir, &cfg.rogue_packages)?;
    let config = select_directories(&ctx.project_dir, &cfg.rogue_config)?;
    let scripts = cfg.rogue_scripts.iter().map(|s| ctx.resolve(s)).collect();
    let library = match &release.lib_dir {
      Some(dirs) => Some(select_directories(&ctx.project_dir, dirs)?),
      None => None,
    };

    if packages.is_empty() {
      return Err(ReleaseError::Config(ConfigError::EmptyList {
        what: "Rogue packages".to_string(),
      }));
    }

    let top_package = cfg.require_top_package()?.to_string();
    let init = entry_point_member(&top_package);

    let entry_point = packages
      .iter()
      .find(|e| e.is_file() && format!("python/{}", e.sub_path) == init)
      .map(|e| e.full_path.clone())
      .ok_or_else(|| {
        ReleaseError::with_help(
          format!("Failed to find file: {}", init),
          "TopRoguePackage must name a package directory inside one of the RoguePackages directories.",
        )
      })?;

    Ok(Self {
      top_package,
      packages,
      config,
      scripts,
      library,
      entry_point,
      license: ctx.git_dir().join("LICENSE.txt"),
    })
  }
}

fn entry_point_member(top_package: &str) -> String {
  format!("python/{}/__init__.py", top_package)
}

/// What went into a written package
#[derive(Debug, Clone)]
pub struct PackageManifest {
  pub archive: PathBuf,
  /// Member names in write order
  pub members: Vec<String>,
  /// Python packages declared in `setup.py`
  pub packages: Vec<String>,
}

/// Build the Rogue zip for a release into `out_dir`
///
/// A failed build removes the partially written archive.
pub fn build_rogue_package(
  ctx: &ProjectContext,
  release: &Release,
  version: &str,
  images: &[PathBuf],
  out_dir: &Path,
) -> ReleaseResult<PackageManifest> {
  let sources = RogueSources::collect(ctx, release)?;
  let archive = out_dir.join(archive_name(PackageKind::Rogue, release, version));

  println!("\n📦 Creating Rogue zipfile {}", archive.display());

  let mut writer = ArchiveWriter::create(&archive)?;
  match write_rogue_members(&mut writer, ctx, &sources, release, version, images) {
    Ok(packages) => {
      let members = writer.finish()?;
      Ok(PackageManifest {
        archive,
        members,
        packages,
      })
    }
    Err(e) => {
      drop(writer);
      if let Err(rm) = fs::remove_file(&archive) {
        tracing::warn!(path = %archive.display(), "failed to remove partial archive: {}", rm);
      }
      Err(e)
    }
  }
}

fn write_rogue_members(
  writer: &mut ArchiveWriter,
  ctx: &ProjectContext,
  sources: &RogueSources,
  release: &Release,
  version: &str,
  images: &[PathBuf],
) -> ReleaseResult<Vec<String>> {
  let top = &sources.top_package;
  let init = entry_point_member(top);

  writer
    .add_file(&sources.license, "LICENSE.txt")
    .context("A LICENSE.txt is required at the top of the git checkout")?;

  let mut packages = Vec::new();
  for entry in &sources.packages {
    let dst = format!("python/{}", entry.sub_path);
    if dst != init {
      writer.add_entry(entry, &dst)?;
    }
    if entry.kind == EntryKind::Folder {
      packages.push(entry.sub_path.clone());
    }
  }

  for entry in &sources.config {
    writer.add_entry(entry, &format!("python/{}/config/{}", top, entry.sub_path))?;
  }

  for image in images {
    let gz = append_extension(image, "gz");
    let src = if gz.is_file() { gz } else { image.clone() };
    let dst = format!("python/{}/images/{}", top, file_name(&src)?);

    // A `.gz` image shared by two selected files is stored once
    if !writer.contains(&dst) {
      writer.add_file(&src, &dst)?;
    }
  }

  let mut script_names = Vec::with_capacity(sources.scripts.len());
  for script in &sources.scripts {
    let name = file_name(script)?;
    writer.add_file(script, &format!("scripts/{}", name))?;
    script_names.push(name);
  }

  if let Some(library) = &sources.library {
    for entry in library {
      writer.add_entry(entry, &format!("lib/{}", entry.sub_path))?;
    }
  }

  let original = fs::read_to_string(&sources.entry_point)
    .with_context(|| format!("Failed to read {}", sources.entry_point.display()))?;
  let rewritten = recipe::rewrite_entry_point(&original, version);
  writer.add_bytes(&init, rewritten.as_bytes(), GENERATED_MODE)?;

  let inputs = RecipeInputs {
    release: &release.name,
    version,
    top_package: top,
    packages: &packages,
    scripts: &script_names,
    has_library: release.has_library(),
    dependencies: &ctx.config.conda_dependencies,
  };

  writer.add_bytes("setup.py", inputs.setup_py().as_bytes(), GENERATED_MODE)?;
  writer.add_bytes("conda-recipe/build.sh", inputs.build_sh().as_bytes(), GENERATED_SCRIPT_MODE)?;
  writer.add_bytes("conda-recipe/meta.yaml", inputs.meta_yaml().as_bytes(), GENERATED_MODE)?;
  writer.add_bytes("conda.sh", recipe::conda_sh().as_bytes(), GENERATED_SCRIPT_MODE)?;

  if release.has_library() {
    writer.add_bytes(
      "conda-recipe/conda_build_config.yaml",
      recipe::conda_build_config().as_bytes(),
      GENERATED_MODE,
    )?;
  }

  Ok(packages)
}

/// `image.bit` -> `image.bit.gz`
fn append_extension(path: &Path, ext: &str) -> PathBuf {
  let mut os = path.as_os_str().to_owned();
  os.push(".");
  os.push(ext);
  PathBuf::from(os)
}
