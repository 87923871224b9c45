//! Progress indicator for the per-file patch loop
//!
//! Uses `linya`, which draws to stderr. Callers only build one when stderr is
//! a terminal and verbose logging is off, and log nothing until it is dropped.

use linya::{Bar, Progress};
use std::io::IsTerminal;

/// Progress bar wrapper for file operations
pub struct FileProgress {
  progress: Progress,
  bar: Bar,
}

impl FileProgress {
  /// Create a new progress bar for file transformations
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// A bar only if `enabled` and stderr is a terminal
  pub fn for_terminal(enabled: bool, total: usize, label: impl Into<String>) -> Option<Self> {
    (enabled && total > 0 && std::io::stderr().is_terminal()).then(|| Self::new(total, label))
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
