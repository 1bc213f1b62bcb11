//! Core building blocks shared by every command
//!
//! - **config**: `releases.yaml` parsing and validation
//! - **context**: per-invocation project context
//! - **error**: error types with contextual help messages and exit codes
//! - **prompt**: value resolution (argument, environment, interactive)
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod prompt;
pub mod vcs;
