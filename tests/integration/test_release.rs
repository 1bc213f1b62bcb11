//! Integration tests for `fw-release release`

use crate::helpers::{BUILD, OLD_BUILD, RELEASES_YAML, TestProject, run_fw_release, run_fw_release_failure};
use anyhow::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::{CompressionMethod, ZipArchive};

fn zip_names(path: &Path) -> Result<Vec<String>> {
  let archive = ZipArchive::new(File::open(path)?)?;
  Ok(archive.file_names().map(String::from).collect())
}

fn zip_text(path: &Path, member: &str) -> Result<String> {
  let mut archive = ZipArchive::new(File::open(path)?)?;
  let mut text = String::new();
  archive.by_name(member)?.read_to_string(&mut text)?;
  Ok(text)
}

#[test]
fn test_release_builds_rogue_zip_and_cpsw_tarball() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.2.0"]),
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Release = demo"));
  assert!(stdout.contains("Version = v1.2.0"));
  assert!(project.out.join("rogue_v1.2.0.zip").is_file());
  assert!(project.out.join("cpsw_v1.2.0.tar.gz").is_file());

  // Attachments are listed with their digests
  let attachments = stdout.split("Attachments:").nth(1).unwrap_or_default();
  assert!(attachments.contains("rogue_v1.2.0.zip"));
  assert!(attachments.contains("cpsw_v1.2.0.tar.gz"));
  assert!(attachments.contains(&format!("{}_primary.mcs", BUILD)));
  assert!(!attachments.contains(OLD_BUILD));

  Ok(())
}

#[test]
fn test_rogue_zip_layout() -> Result<()> {
  let project = TestProject::new()?;
  run_fw_release(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.2.0"]),
  )?;

  let names = zip_names(&project.out.join("rogue_v1.2.0.zip"))?;
  for expected in [
    "LICENSE.txt".to_string(),
    "python/demo/".to_string(),
    "python/demo/__init__.py".to_string(),
    "python/demo/_Core.py".to_string(),
    "python/demo/config/defaults.yml".to_string(),
    format!("python/demo/images/{}.bin", BUILD),
    format!("python/demo/images/{}.mcs", BUILD),
    format!("python/demo/images/{}_primary.mcs", BUILD),
    "scripts/run_gui.py".to_string(),
    "setup.py".to_string(),
    "conda-recipe/build.sh".to_string(),
    "conda-recipe/meta.yaml".to_string(),
    "conda.sh".to_string(),
  ] {
    assert!(names.contains(&expected), "missing {} in {:?}", expected, names);
  }

  assert!(!names.iter().any(|n| n.contains("__pycache__")));
  assert!(!names.iter().any(|n| n.contains(OLD_BUILD)));
  assert!(!names.iter().any(|n| n.starts_with("lib/")));
  assert!(!names.contains(&"conda-recipe/conda_build_config.yaml".to_string()));

  Ok(())
}

#[test]
fn test_rogue_zip_is_stored_uncompressed() -> Result<()> {
  let project = TestProject::new()?;
  run_fw_release(
    &project.path,
    &project.release_args(&["--build", "latest", "--version", "v1.2.0"]),
  )?;

  let mut archive = ZipArchive::new(File::open(project.out.join("rogue_v1.2.0.zip"))?)?;
  for idx in 0..archive.len() {
    let member = archive.by_index(idx)?;
    assert_eq!(member.compression(), CompressionMethod::Stored, "{} is compressed", member.name());
  }

  Ok(())
}

#[test]
fn test_entry_point_is_rewritten() -> Result<()> {
  let project = TestProject::new()?;
  run_fw_release(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.2.0"]),
  )?;

  let init = zip_text(&project.out.join("rogue_v1.2.0.zip"), "python/demo/__init__.py")?;

  assert!(init.starts_with("import pyrogue\nfrom demo._Core import *\n"));
  assert!(!init.contains("__version__ = 'dev'"));
  assert!(!init.contains("../../config"));
  assert!(init.contains("__version__ = 'v1.2.0'\n"));
  assert!(init.contains("ConfigDir = os.path.dirname(__file__) + '/config'\n"));
  assert!(init.contains("ImageDir  = os.path.dirname(__file__) + '/images'\n"));

  let setup = zip_text(&project.out.join("rogue_v1.2.0.zip"), "setup.py")?;
  assert!(setup.contains("   version='v1.2.0',\n"));
  assert!(setup.contains("'demo'"));

  Ok(())
}

#[test]
fn test_compressed_image_is_preferred() -> Result<()> {
  let project = TestProject::new()?;
  project.write(&format!("images/{}.bin.gz", BUILD), "compressed")?;

  run_fw_release(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.2.1"]),
  )?;

  let zip = project.out.join("rogue_v1.2.1.zip");
  let names = zip_names(&zip)?;
  assert!(names.contains(&format!("python/demo/images/{}.bin.gz", BUILD)));
  assert!(!names.contains(&format!("python/demo/images/{}.bin", BUILD)));
  assert_eq!(zip_text(&zip, &format!("python/demo/images/{}.bin.gz", BUILD))?, "compressed");

  Ok(())
}

#[test]
fn test_cpsw_tarball_layout() -> Result<()> {
  let project = TestProject::new()?;
  run_fw_release(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.2.0"]),
  )?;

  let file = File::open(project.out.join("cpsw_v1.2.0.tar.gz"))?;
  let mut archive = tar::Archive::new(GzDecoder::new(file));
  let mut names = Vec::new();
  for entry in archive.entries()? {
    names.push(entry?.path()?.to_string_lossy().into_owned());
  }
  names.sort();

  assert_eq!(
    names,
    vec![
      "demo_project.yaml/000TopLevel.yaml",
      "demo_project.yaml/app/AppCore.yaml",
      "demo_project.yaml/config/defaults.yaml",
    ]
  );

  Ok(())
}

#[test]
fn test_secondary_release_names_archives() -> Result<()> {
  let config = RELEASES_YAML.replace("    Primary: true\n", "    Primary: false\n");
  let project = TestProject::with_config(&config)?;

  run_fw_release(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v2.0.0"]),
  )?;

  assert!(project.out.join("rogue_demo_v2.0.0.zip").is_file());
  assert!(project.out.join("cpsw_demo_v2.0.0.tar.gz").is_file());

  Ok(())
}

#[test]
fn test_unknown_build_is_rejected() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--build", "fpgaA-v9-nope", "--version", "v1.2.0"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("Invalid build arg: fpgaA-v9-nope"), "stderr: {}", stderr);
  assert!(!project.out.join("rogue_v1.2.0.zip").exists());

  Ok(())
}

#[test]
fn test_hyphenated_release_name_is_rejected() -> Result<()> {
  let config = RELEASES_YAML.replace("  demo:\n", "  demo-fw:\n");
  let project = TestProject::with_config(&config)?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--release", "demo-fw", "--build", BUILD, "--version", "v1.2.0"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("Invalid release name 'demo-fw'"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_undeclared_target_is_rejected() -> Result<()> {
  let config = RELEASES_YAML.replace("      - fpgaA\n    Types", "      - fpgaB\n    Types");
  let project = TestProject::with_config(&config)?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--build", "latest", "--version", "v1.2.0"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(
    stderr.contains("Referenced target fpgaB is missing in target list!"),
    "stderr: {}",
    stderr
  );

  Ok(())
}

#[test]
fn test_missing_values_fail_without_prompting() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(&project.path, &project.release_args(&["--build", BUILD]))?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!project.out.join("rogue_v1.2.0.zip").exists());

  Ok(())
}

#[test]
fn test_invalid_version_is_rejected() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.x.0"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("Invalid release version 'v1.x.0'"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_push_refuses_dirty_checkout() -> Result<()> {
  let project = TestProject::new()?;
  project.write("README.md", "# Uncommitted change\n")?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.0.0", "--prev", "", "--push"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("is dirty"), "stderr: {}", stderr);
  assert!(project.tags()?.is_empty());
  assert!(!project.out.join("rogue_v1.0.0.zip").exists());

  Ok(())
}

#[test]
fn test_push_refuses_existing_tag() -> Result<()> {
  let project = TestProject::new()?;
  crate::helpers::git(&project.path, &["tag", "-a", "v1.0.0", "-m", "Major Release v1.0.0"])?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.0.0", "--prev", "", "--push"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("local repo: newTag=v1.0.0 already exists"), "stderr: {}", stderr);
  assert_eq!(project.tags()?, vec!["v1.0.0"]);

  Ok(())
}

#[test]
fn test_push_refuses_missing_previous_tag() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_fw_release_failure(
    &project.path,
    &project.release_args(&["--build", BUILD, "--version", "v1.1.0", "--prev", "v1.0.0", "--push"]),
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("local repo: oldTag=v1.0.0 does NOT exist"), "stderr: {}", stderr);
  assert!(project.tags()?.is_empty());

  Ok(())
}
