//! Error types for fw-release with contextual messages and exit codes
//!
//! Errors are grouped by how a user recovers from them: configuration and
//! selection problems are fixed by re-running with different input,
//! repository-state and data-quality problems are fixed in the repository or
//! on GitHub, and system failures (git, network, I/O) are reported as-is.
//! Nothing is retried.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for fw-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid selection, bad arguments)
  User = 1,
  /// System error (git, network, I/O)
  System = 2,
  /// Validation failure (repository state, incomplete PR data)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for fw-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors (releases.yaml)
  Config(ConfigError),

  /// A release, build, index or version did not resolve
  Selection(SelectionError),

  /// The repository is not in a state that allows a release
  Repository(RepositoryError),

  /// Remote data is incomplete and must be fixed by a human
  DataQuality { message: String, url: String },

  /// Git operation errors
  Git(GitError),

  /// Remote hosting API errors
  Remote(RemoteError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Categorised errors are turned into messages so the context is not lost;
  /// the help text of the original error is kept.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => {
        let help = other.help_message();
        ReleaseError::Message {
          message: ctx_str,
          context: Some(other.to_string()),
          help,
        }
      }
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) | ReleaseError::Selection(_) | ReleaseError::Message { .. } => ExitCode::User,
      ReleaseError::Repository(_) | ReleaseError::DataQuality { .. } => ExitCode::Validation,
      ReleaseError::Git(_) | ReleaseError::Remote(_) | ReleaseError::Io(_) => ExitCode::System,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Selection(e) => e.help_message(),
      ReleaseError::Repository(e) => e.help_message(),
      ReleaseError::DataQuality { url, .. } => Some(format!(
        "Open {} in your web browser, fill in the description, then run the release again.",
        url
      )),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Remote(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Selection(e) => write!(f, "{}", e),
      ReleaseError::Repository(e) => write!(f, "{}", e),
      ReleaseError::DataQuality { message, .. } => write!(f, "{}", message),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Remote(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<SelectionError> for ReleaseError {
  fn from(err: SelectionError) -> Self {
    ReleaseError::Selection(err)
  }
}

impl From<RepositoryError> for ReleaseError {
  fn from(err: RepositoryError) -> Self {
    ReleaseError::Repository(err)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<RemoteError> for ReleaseError {
  fn from(err: RemoteError) -> Self {
    ReleaseError::Remote(err)
  }
}

impl From<serde_yaml::Error> for ReleaseError {
  fn from(err: serde_yaml::Error) -> Self {
    ReleaseError::message(format!("YAML parse error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<zip::result::ZipError> for ReleaseError {
  fn from(err: zip::result::ZipError) -> Self {
    ReleaseError::message(format!("Zip archive error: {}", err))
  }
}

impl From<walkdir::Error> for ReleaseError {
  fn from(err: walkdir::Error) -> Self {
    ReleaseError::message(format!("Directory walk error: {}", err))
  }
}

impl From<regex::Error> for ReleaseError {
  fn from(err: regex::Error) -> Self {
    ReleaseError::message(format!("Pattern error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for ReleaseError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ReleaseError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// releases.yaml not found or unreadable
  NotFound { path: PathBuf },

  /// Missing or empty required key
  MissingField { field: String },

  /// A release references a target that is not declared
  UndeclaredTarget { target: String },

  /// A configured list resolved to nothing
  EmptyList { what: String },

  /// Release names end up in python package names
  InvalidReleaseName { name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Pass the firmware project directory with --project.".to_string()),
      ConfigError::UndeclaredTarget { target } => Some(format!("Add '{}' to the Targets section of releases.yaml.", target)),
      ConfigError::InvalidReleaseName { .. } => Some("Rename the release using '_' instead of '-'.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Failed to load project release file {}", path.display())
      }
      ConfigError::MissingField { field } => {
        write!(f, "Invalid release config. {} is missing or empty!", field)
      }
      ConfigError::UndeclaredTarget { target } => {
        write!(f, "Invalid release config. Referenced target {} is missing in target list!", target)
      }
      ConfigError::EmptyList { what } => {
        write!(f, "Invalid release config. {} list is empty!", what)
      }
      ConfigError::InvalidReleaseName { name } => {
        write!(f, "Invalid release name '{}'. Release names with '-' are not supported in python!", name)
      }
    }
  }
}

/// Errors raised when user input does not resolve to a single choice
#[derive(Debug)]
pub enum SelectionError {
  /// Index outside the presented list
  InvalidIndex { what: String, input: String },

  /// Explicit name not among the candidates
  UnknownName { what: String, name: String, available: Vec<String> },

  /// Nothing to choose from
  NoCandidates { what: String },

  /// Version string that cannot be classified
  InvalidVersion { version: String, reason: String },

  /// A required value was not supplied and cannot be asked for
  MissingValue { what: String },
}

impl SelectionError {
  fn help_message(&self) -> Option<String> {
    match self {
      SelectionError::UnknownName { available, .. } if !available.is_empty() => {
        Some(format!("Available: {}", available.join(", ")))
      }
      SelectionError::InvalidVersion { .. } => Some("Versions look like v1.2.3".to_string()),
      SelectionError::MissingValue { .. } => {
        Some("Pass the value on the command line or drop --non-interactive.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for SelectionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SelectionError::InvalidIndex { what, input } => write!(f, "Invalid {} index: {}", what, input),
      SelectionError::UnknownName { what, name, .. } => write!(f, "Invalid {} arg: {}", what, name),
      SelectionError::NoCandidates { what } => write!(f, "No {} found", what),
      SelectionError::InvalidVersion { version, reason } => {
        write!(f, "Invalid release version '{}': {}", version, reason)
      }
      SelectionError::MissingValue { what } => write!(f, "{} not provided", what),
    }
  }
}

/// Where a tag was looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLocation {
  Local,
  Remote,
}

impl fmt::Display for TagLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TagLocation::Local => write!(f, "local repo"),
      TagLocation::Remote => write!(f, "remote repo"),
    }
  }
}

/// Repository state that blocks a release
#[derive(Debug)]
pub enum RepositoryError {
  /// Uncommitted changes in tracked files
  Dirty { path: PathBuf },

  /// The previous release tag is missing
  TagMissing { tag: String, location: TagLocation },

  /// The new release tag already exists
  TagExists { tag: String, location: TagLocation },

  /// The tag being released is not in the checkout
  ReleaseTagMissing { tag: String },

  /// A release object already exists for the tag
  ReleaseExists { tag: String },
}

impl RepositoryError {
  fn help_message(&self) -> Option<String> {
    match self {
      RepositoryError::Dirty { .. } => Some("Commit or stash your changes before tagging a release.".to_string()),
      RepositoryError::TagMissing { location: TagLocation::Local, .. } => {
        Some("Fetch tags with `git fetch --tags`, or check --prev.".to_string())
      }
      RepositoryError::TagMissing { .. } => Some("Push the previous release tag, or check --prev.".to_string()),
      RepositoryError::ReleaseTagMissing { .. } => {
        Some("Fetch tags with `git fetch --tags`, and make sure the clone is not shallow.".to_string())
      }
      RepositoryError::TagExists { .. } | RepositoryError::ReleaseExists { .. } => {
        Some("Releases are never overwritten. Pick a new version.".to_string())
      }
    }
  }
}

impl fmt::Display for RepositoryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RepositoryError::Dirty { path } => write!(f, "Cannot create tag! Git repo at {} is dirty!", path.display()),
      RepositoryError::TagMissing { tag, location } => write!(f, "{}: oldTag={} does NOT exist", location, tag),
      RepositoryError::TagExists { tag, location } => write!(f, "{}: newTag={} already exists", location, tag),
      RepositoryError::ReleaseTagMissing { tag } => write!(f, "{}: tag={} does NOT exist", TagLocation::Local, tag),
      RepositoryError::ReleaseExists { tag } => write!(f, "{} release already exists", tag),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Push failed
  PushFailed { remote: String, refspec: String, reason: String },

  /// Log output did not follow the expected layout
  MalformedLog { line: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your SSH key and your write access to the repository.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!("Check GitBase in releases.yaml: {}", path.display())),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::PushFailed { remote, refspec, reason } => {
        write!(f, "Push of {} to {} failed: {}", refspec, remote, reason)
      }
      GitError::MalformedLog { line } => {
        write!(f, "Unrecognised merge commit line in git log: {}", line)
      }
    }
  }
}

/// Remote hosting API errors
#[derive(Debug)]
pub enum RemoteError {
  /// Server answered with an error status
  Status { url: String, status: u16 },

  /// Request never completed (DNS, TLS, timeout, bad payload)
  Transport { url: String, reason: String },

  /// Origin URL does not point at the expected organisation
  UnknownRepository { url: String, org: String },

  /// Asset upload failed after the release was created
  UploadFailed {
    asset: PathBuf,
    release_url: String,
    uploaded: Vec<String>,
    reason: String,
  },

  /// Release has no asset with that name
  AssetNotFound { tag: String, asset: String },
}

impl RemoteError {
  fn help_message(&self) -> Option<String> {
    match self {
      RemoteError::Status { status: 401, .. } | RemoteError::Status { status: 403, .. } => {
        Some("Check that your GitHub token is valid and has repo scope: https://github.com/settings/tokens".to_string())
      }
      RemoteError::UploadFailed { release_url, .. } => Some(format!(
        "The release was created but is incomplete. Upload the remaining assets at {} or delete the release.",
        release_url
      )),
      _ => None,
    }
  }
}

impl fmt::Display for RemoteError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RemoteError::Status { url, status } => write!(f, "GitHub request {} failed with status {}", url, status),
      RemoteError::Transport { url, reason } => write!(f, "GitHub request {} failed: {}", url, reason),
      RemoteError::UnknownRepository { url, org } => {
        write!(f, "Remote URL {} is not a repository of the {} organisation", url, org)
      }
      RemoteError::UploadFailed {
        asset, uploaded, reason, ..
      } => {
        write!(f, "Failed to upload {}: {}", asset.display(), reason)?;
        if uploaded.is_empty() {
          write!(f, "\nNo assets were attached")
        } else {
          write!(f, "\nAlready attached: {}", uploaded.join(", "))
        }
      }
      RemoteError::AssetNotFound { tag, asset } => write!(f, "Asset {} not found in release {}", asset, tag),
    }
  }
}

/// Result type alias for fw-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
