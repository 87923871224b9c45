pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::ReleaseResult;
use std::path::PathBuf;

/// Version-control operations the release pipeline needs.
///
/// Every method fails fatally on an underlying git error; the pipeline never
/// retries. `push_to_origin` and `cleanup` are only called on live runs.
pub trait VersionControl {
  /// Whether `branch` exists on the upstream remote
  fn remote_branch_exists(&self, branch: &str) -> ReleaseResult<bool>;

  /// Check out `branch` in the working tree
  fn switch_to_branch(&self, branch: &str) -> ReleaseResult<()>;

  /// Create and check out the transient release branch from HEAD
  fn create_tag_branch(&self, working_branch: &str) -> ReleaseResult<()>;

  /// Commit exactly `files` on the active branch. When none of them differ
  /// from HEAD no commit is made and HEAD stays where it is.
  fn commit(&self, files: &[PathBuf], message: &str) -> ReleaseResult<()>;

  /// Create the permanent annotated tag at HEAD
  fn tag_for_release(&self, tag: &str, message: &str) -> ReleaseResult<()>;

  /// Push the tag to the upstream remote
  fn push_to_origin(&self, tag: &str) -> ReleaseResult<()>;

  /// Return to `branch` and delete the transient branch locally and upstream
  fn cleanup(&self, branch: &str, working_branch: &str) -> ReleaseResult<()>;

  /// Whether the upstream remote URL contains `upstream_url`
  fn is_upstream_clone(&self, upstream_url: &str) -> ReleaseResult<bool>;
}
