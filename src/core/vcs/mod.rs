pub mod system_git;
mod system_git_ops;

#[cfg(test)]
pub(crate) mod fixture;

pub use system_git::SystemGit;
pub use system_git_ops::MERGE_MARKER;
