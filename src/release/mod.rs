//! Firmware release pipeline
//!
//! Stages, in the order the `release` command runs them:
//!
//! - [`select`]: pick the release and the build images to ship
//! - [`version`]: classify the version as a major, minor or patch release
//! - [`files`], [`recipe`], [`package`]: assemble the Rogue zip
//! - [`bundle`]: assemble the CPSW tarball
//! - [`publish`]: tag, generate [`notes`], create the release, attach files

pub mod bundle;
pub mod files;
pub mod notes;
pub mod package;
pub mod publish;
pub mod recipe;
pub mod select;
pub mod version;
