//! Generated text for the installable package: entry point, setup script and
//! conda recipe

/// Dependency pin used when none starting with `rogue` is configured
pub const DEFAULT_ROGUE_DEP: &str = "rogue";

/// Dependency pin used when none starting with `python` is configured
pub const DEFAULT_PYTHON_DEP: &str = "python>=3.7";

/// Lines containing any of these are dropped from the entry point
const ENTRY_POINT_DROPPED: [&str; 4] = ["import os", "__version__", "ConfigDir", "ImageDir"];

/// Rewrite the top package `__init__.py` for an installed release
///
/// Development-tree assignments of the version and the config/image
/// directories are removed and replaced with a trailer pointing at the
/// directories shipped inside the package.
pub fn rewrite_entry_point(original: &str, version: &str) -> String {
  let mut text: String = original
    .split_inclusive('\n')
    .filter(|line| !ENTRY_POINT_DROPPED.iter().any(|marker| line.contains(marker)))
    .collect();

  text.push_str("\n\n");
  text.push_str("##################### Added by release script ###################\n");
  text.push_str("import os\n");
  text.push_str(&format!("__version__ = '{}'\n", version));
  text.push_str("ConfigDir = os.path.dirname(__file__) + '/config'\n");
  text.push_str("ImageDir  = os.path.dirname(__file__) + '/images'\n");
  text.push_str("#################################################################\n");
  text
}

/// Inputs shared by the generated setup script and recipe
#[derive(Debug, Clone)]
pub struct RecipeInputs<'a> {
  pub release: &'a str,
  pub version: &'a str,
  pub top_package: &'a str,
  /// Package folders, `/`-separated, in collection order
  pub packages: &'a [String],
  /// Script file names installed under `scripts/`
  pub scripts: &'a [String],
  pub has_library: bool,
  pub dependencies: &'a [String],
}

impl RecipeInputs<'_> {
  /// `setup.py` at the archive root
  pub fn setup_py(&self) -> String {
    let mut out = String::from("\n\nfrom setuptools import setup\n\n");
    out.push_str("setup (\n");
    out.push_str(&format!("   name='{}',\n", self.release));
    out.push_str(&format!("   version='{}',\n", self.version));
    out.push_str("   packages=[\n");
    for package in self.packages {
      out.push_str(&format!("             '{}',\n", package));
    }
    out.push_str("            ],\n");
    out.push_str("   package_dir={'':'python'},\n");
    out.push_str(&format!(
      "   package_data={{'{}':['config/*','images/*'],\n",
      self.top_package
    ));
    if self.has_library {
      out.push_str("                 '' : ['../*.so'],\n");
    }
    out.push_str("                },\n");

    if !self.scripts.is_empty() {
      out.push_str("   scripts=[\n");
      for script in self.scripts {
        out.push_str(&format!("             'scripts/{}',\n", script));
      }
      out.push_str("            ],\n");
    }

    out.push_str(")\n");
    out
  }

  /// `conda-recipe/build.sh`
  pub fn build_sh(&self) -> String {
    let mut out = String::from("#!/usr/bin/bash\n\n");
    if self.has_library {
      out.push_str("mkdir lib_build\n");
      out.push_str("cd lib_build\n");
      out.push_str("cmake ../lib\n");
      out.push_str("make -j ${CPU_COUNT}\n");
      out.push_str("cd ..\n");
    }
    out.push_str("${PYTHON} -m pip install .\n\n");
    out
  }

  /// Rogue and python pins after applying overrides
  fn core_dependencies(&self) -> (&str, &str) {
    let mut rogue = DEFAULT_ROGUE_DEP;
    let mut python = DEFAULT_PYTHON_DEP;

    for dep in self.dependencies {
      if dep.starts_with("rogue") {
        rogue = dep.as_str();
      }
      if dep.starts_with("python") {
        python = dep.as_str();
      }
    }

    (rogue, python)
  }

  /// `conda-recipe/meta.yaml`
  pub fn meta_yaml(&self) -> String {
    let (rogue, python) = self.core_dependencies();

    let mut out = String::from("package:\n");
    out.push_str(&format!("  name: {}\n", self.release.to_lowercase()));
    out.push_str(&format!("  version: {}\n", self.version));
    out.push('\n');
    out.push_str("source:\n");
    out.push_str("  path: ..\n");
    out.push('\n');
    out.push_str("build:\n");
    out.push_str("  number: 1\n");
    if !self.has_library {
      out.push_str("  noarch: python\n");
    }
    out.push('\n');
    out.push_str("requirements:\n");

    if self.has_library {
      out.push_str("  build:\n");
      out.push_str("    - {{ compiler('c') }}\n");
      out.push_str("    - {{ compiler('cxx') }}\n");
      out.push_str("    - cmake\n");
      out.push_str("    - make\n");
      out.push_str(&format!("    - {}\n", rogue));
      out.push('\n');
    }

    out.push_str("  host:\n");
    out.push_str(&format!("    - {}\n", rogue));
    out.push_str(&format!("    - {}\n", python));
    out.push('\n');
    out.push_str("  run:\n");
    out.push_str(&format!("    - {}\n", python));
    out.push_str(&format!("    - {}\n", rogue));
    for dep in self.dependencies {
      if !dep.starts_with("rogue") && !dep.starts_with("python") {
        out.push_str(&format!("    - {}\n", dep));
      }
    }

    out.push('\n');
    out.push_str("about:\n");
    out.push_str("  license: SLAC Open License\n");
    out.push_str("  license_file: LICENSE.txt\n");
    out.push('\n');
    out
  }
}

/// `conda.sh` at the archive root
pub fn conda_sh() -> String {
  "#!/usr/bin/bash\n\n\
   conda build --debug conda-recipe --output-folder bld-dir -c tidair-tag -c tidair-packages -c conda-forge\n\n"
    .to_string()
}

/// `conda-recipe/conda_build_config.yaml`, written only with a library
pub fn conda_build_config() -> String {
  let mut out = String::from("pin_run_as_build:\n");
  out.push_str("  rogue:\n");
  out.push_str("    max_pin: x.x.x\n");
  out.push_str("  python:\n");
  out.push_str("    max_pin: x.x\n");
  out
}
