//! Per-invocation release context
//!
//! `ReleaseRun` is created once, after the version is validated, and handed
//! to every pipeline stage. Nothing about a run lives in globals, so each
//! stage can be driven on its own with fake collaborators.

use crate::release::version::Version;
use std::path::PathBuf;

/// State of one release, from confirmation to the final tag
#[derive(Debug, Clone)]
pub struct ReleaseRun {
  /// Target version (already validated)
  pub version: Version,

  /// Branch the release is cut from
  pub branch: String,

  /// Project root; every relative path in settings resolves against it
  pub root: PathBuf,

  /// Remote-mutating calls become no-ops
  pub dry_run: bool,

  /// Publication tasks run concurrently
  pub parallel: bool,

  /// Files changed by the version bump, in the order they were patched
  pub modified: Vec<PathBuf>,
}

impl ReleaseRun {
  pub fn new(version: Version, branch: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    Self {
      version,
      branch: branch.into(),
      root: root.into(),
      dry_run: true,
      parallel: false,
      modified: Vec::new(),
    }
  }

  pub fn dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  pub fn parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  /// Short-lived branch that carries the version-bump commit until tagging
  pub fn working_branch(&self) -> String {
    format!("__release_{}", self.version)
  }

  /// Name of the permanent release tag
  pub fn tag_name(&self) -> String {
    self.version.to_string()
  }

  /// Record a modified file once, keeping first-seen order
  pub fn record_modified(&mut self, path: PathBuf) {
    if !self.modified.contains(&path) {
      self.modified.push(path);
    }
  }
}
