mod commands;
mod core;
mod release;
mod remote;
mod ui;
mod utils;

use anstyle::{AnsiColor, Color, Style};
use clap::builder::Styles;
use clap::{Parser, Subcommand};
use crate::core::error::{ReleaseError, print_error};
use crate::core::prompt::{NoPrompt, Prompt, StdinPrompt};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Package firmware build images and publish them as GitHub releases
#[derive(Parser)]
#[command(name = "fw-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Show git and HTTP diagnostics on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Fail instead of prompting for missing values
  #[arg(long, global = true)]
  non_interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Package a release and optionally tag and publish it
  Release {
    /// Firmware project directory (holds releases.yaml)
    #[arg(long)]
    project: PathBuf,
    /// Release to generate
    #[arg(long)]
    release: Option<String>,
    /// Build base name to include, or 'latest' to auto select
    #[arg(long)]
    build: Option<String>,
    /// Version of the release (e.g. v1.2.3)
    #[arg(long)]
    version: Option<String>,
    /// Previous version for release notes; empty for a first release
    #[arg(long)]
    prev: Option<String>,
    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,
    /// Directory for the generated archives
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Tag the repository and publish the release to GitHub
    #[arg(long)]
    push: bool,
  },

  /// Print release notes for a tag range
  Notes {
    /// Git checkout to read the merge log from
    #[arg(long, default_value = ".")]
    repo_dir: PathBuf,
    /// Older tag (default: the tag before --new)
    #[arg(long)]
    old: Option<String>,
    /// Newer tag (default: git describe --tags)
    #[arg(long)]
    new: Option<String>,
    /// GitHub organisation owning the repository
    #[arg(long, default_value = crate::core::config::DEFAULT_GITHUB_ORG)]
    org: String,
    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,
  },

  /// Publish the release of a tag pushed by CI
  Ci {
    /// Git checkout holding the tag
    #[arg(long, default_value = ".")]
    repo_dir: PathBuf,
    /// Repository as owner/name (falls back to TRAVIS_REPO_SLUG)
    #[arg(long)]
    repo: Option<String>,
    /// Release tag (falls back to TRAVIS_TAG)
    #[arg(long)]
    tag: Option<String>,
    /// GitHub token (falls back to GH_REPO_TOKEN)
    #[arg(long)]
    token: Option<String>,
  },

  /// Download an asset from a release (token from GITHUB_TOKEN)
  DownloadAsset {
    /// Repository as owner/name, e.g. slaclab/epix-hr-m-320k
    #[arg(long)]
    repo: String,
    /// Release tag, e.g. v1.1.4
    #[arg(long)]
    tag: String,
    /// Asset file name
    #[arg(long)]
    asset: String,
    /// Destination directory
    #[arg(long)]
    output: Option<PathBuf>,
  },
}

fn paint(color: AnsiColor) -> Style {
  Style::new().fg_color(Some(Color::Ansi(color)))
}

fn get_styles() -> Styles {
  let heading = paint(AnsiColor::Cyan).bold().underline();

  Styles::styled()
    .usage(heading)
    .header(heading)
    .literal(paint(AnsiColor::Green).bold())
    .placeholder(paint(AnsiColor::BrightBlack))
    .valid(paint(AnsiColor::Green))
    .invalid(paint(AnsiColor::Yellow).bold())
    .error(paint(AnsiColor::Red).bold())
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let mut prompt: Box<dyn Prompt> = if cli.non_interactive {
    Box::new(NoPrompt)
  } else {
    Box::new(StdinPrompt)
  };

  let result = match cli.command {
    Commands::Release {
      project,
      release,
      build,
      version,
      prev,
      token,
      output_dir,
      push,
    } => commands::run_release(
      commands::ReleaseOptions {
        project,
        release,
        build,
        version,
        prev,
        token,
        output_dir,
        push,
      },
      prompt.as_mut(),
    ),
    Commands::Notes {
      repo_dir,
      old,
      new,
      org,
      token,
    } => commands::run_notes(&repo_dir, old, new, &org, token, prompt.as_mut()),
    Commands::Ci {
      repo_dir,
      repo,
      tag,
      token,
    } => commands::run_ci(&repo_dir, repo, tag, token),
    Commands::DownloadAsset {
      repo,
      tag,
      asset,
      output,
    } => commands::run_download_asset(&repo, &tag, &asset, output),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
