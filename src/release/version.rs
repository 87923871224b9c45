//! Release version validation
//!
//! A release version has exactly four dot-separated segments:
//! `MAJOR.MINOR.MICRO.QUALIFIER`, the first three numeric and the qualifier
//! alphanumeric. Accepted input is trimmed and upper-cased once; everything
//! downstream takes a [`Version`] and never re-checks it.

use crate::core::error::{ReleaseError, ReleaseResult};
use regex::Regex;
use std::fmt;

const VERSION_PATTERN: &str = r"^(\d+)\.(\d+)\.(\d+)\.([A-Za-z0-9]+)$";

/// A validated, canonical (upper-cased) release version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
  canonical: String,
}

impl Version {
  /// Validate and canonicalize a user-supplied version string
  pub fn parse(raw: &str) -> ReleaseResult<Self> {
    let trimmed = raw.trim();
    let pattern = Regex::new(VERSION_PATTERN)?;
    if !pattern.is_match(trimmed) {
      return Err(ReleaseError::InvalidVersion { input: raw.to_string() });
    }

    Ok(Self {
      canonical: trimmed.to_uppercase(),
    })
  }

  pub fn as_str(&self) -> &str {
    &self.canonical
  }

  fn segment(&self, idx: usize) -> &str {
    // Four segments are guaranteed by `parse`
    self.canonical.split('.').nth(idx).unwrap_or_default()
  }

  /// `MAJOR.MINOR`, used for the documentation directory
  pub fn major_minor(&self) -> String {
    format!("{}.{}", self.segment(0), self.segment(1))
  }

  pub fn micro(&self) -> &str {
    self.segment(2)
  }

  pub fn qualifier(&self) -> &str {
    self.segment(3)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical)
  }
}
