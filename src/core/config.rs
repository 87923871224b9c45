//! Release settings (the required settings source)
//!
//! Searched in order: `--settings <path>`, then release.toml, .release.toml,
//! .config/release.toml under the project root, then ~/.release-train.toml.
//! A release never starts without one.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROJECT_CANDIDATES: [&str; 3] = ["release.toml", ".release.toml", ".config/release.toml"];
const HOME_SETTINGS: &str = ".release-train.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
  /// Debug-level logging
  #[serde(default)]
  pub verbose: bool,

  /// Route every remote-mutating call (upload, tag push, branch deletion) to a no-op
  #[serde(default = "default_true")]
  pub dry_run: bool,

  /// Run publication tasks concurrently
  #[serde(default)]
  pub multi_threaded: bool,

  /// Branch released from when none is given on the command line
  #[serde(default = "default_main_branch")]
  pub main_branch: String,

  /// Name of the upstream remote
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Substring of the remote URL that identifies the canonical upstream clone
  #[serde(default = "default_upstream_url")]
  pub upstream_url: String,

  /// Prefix of the distribution archive and its extracted directory
  #[serde(default = "default_project_name")]
  pub project_name: String,

  /// Canonical file name of build-configuration files
  #[serde(default = "default_config_file_name")]
  pub config_file_name: String,

  /// Directory names pruned from the configuration tree walk
  #[serde(default = "default_scan_exclude")]
  pub scan_exclude: Vec<String>,

  /// Generated source file holding the version constants (relative to root)
  #[serde(default = "default_version_source")]
  pub version_source: PathBuf,

  /// Build/test invocation, program first
  #[serde(default = "default_build_command")]
  pub build_command: Vec<String>,

  #[serde(default = "default_build_timeout")]
  pub build_timeout_secs: u64,

  #[serde(default = "default_upload_timeout")]
  pub upload_timeout_secs: u64,

  /// Where the build leaves its archives (relative to root)
  #[serde(default = "default_distribution_dir")]
  pub distribution_dir: PathBuf,

  /// Optional script run inside the extracted doc directory before upload
  #[serde(default)]
  pub docs_tracker_script: Option<PathBuf>,

  #[serde(default = "default_rsync_flags")]
  pub rsync_flags: Vec<String>,

  pub destinations: Destinations,

  /// File these settings were read from
  #[serde(skip)]
  pub source: Option<PathBuf>,
}

/// Remote targets for each artifact family
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Destinations {
  pub docs: String,
  pub binaries: String,
  pub schema: String,
}

fn default_true() -> bool {
  true
}

fn default_main_branch() -> String {
  "master".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_upstream_url() -> String {
  "github.com/infinispan/infinispan".to_string()
}

fn default_project_name() -> String {
  "infinispan".to_string()
}

fn default_config_file_name() -> String {
  "pom.xml".to_string()
}

fn default_scan_exclude() -> Vec<String> {
  vec![".git".to_string()]
}

fn default_version_source() -> PathBuf {
  PathBuf::from("core/src/main/java/org/infinispan/Version.java")
}

fn default_build_command() -> Vec<String> {
  ["mvn", "clean", "install", "-Pdistribution"]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_build_timeout() -> u64 {
  4 * 60 * 60
}

fn default_upload_timeout() -> u64 {
  60 * 60
}

fn default_distribution_dir() -> PathBuf {
  PathBuf::from("target/distribution")
}

fn default_rsync_flags() -> Vec<String> {
  vec!["-rv".to_string(), "--protocol=28".to_string()]
}

impl Settings {
  /// Locate and load settings.
  ///
  /// `explicit` (from `--settings`) is the only candidate when given.
  pub fn load(root: &Path, explicit: Option<&Path>) -> ReleaseResult<Self> {
    let candidates = match explicit {
      Some(path) => vec![path.to_path_buf()],
      None => Self::search_paths(root),
    };

    let found = candidates.iter().find(|p| p.is_file()).cloned();
    let Some(path) = found else {
      return Err(ReleaseError::Config(ConfigError::NotFound { searched: candidates }));
    };

    Self::from_file(&path)
  }

  /// Candidate settings locations, in search order
  pub fn search_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = PROJECT_CANDIDATES.iter().map(|c| root.join(c)).collect();
    if let Some(home) = std::env::var_os("HOME") {
      paths.push(PathBuf::from(home).join(HOME_SETTINGS));
    }
    paths
  }

  pub fn from_file(path: &Path) -> ReleaseResult<Self> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut settings = Self::parse(&content).map_err(|e| {
      ReleaseError::Config(ConfigError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })?;
    settings.source = Some(path.to_path_buf());
    Ok(settings)
  }

  /// Parse and validate settings from TOML text
  pub fn parse(content: &str) -> ReleaseResult<Self> {
    let settings: Settings = toml_edit::de::from_str(content)?;
    settings.validate()?;
    Ok(settings)
  }

  /// Reject settings that would fail halfway through a release
  pub fn validate(&self) -> ReleaseResult<()> {
    if self.build_command.is_empty() {
      return Err(ReleaseError::message("build_command must name a program"));
    }
    if self.config_file_name.trim().is_empty() {
      return Err(ReleaseError::message("config_file_name must not be empty"));
    }

    let Destinations { docs, binaries, schema } = &self.destinations;
    for (key, value) in [("docs", docs), ("binaries", binaries), ("schema", schema)] {
      if value.trim().is_empty() {
        return Err(ReleaseError::message(format!("destinations.{} must not be empty", key)));
      }
    }

    Ok(())
  }

  pub fn build_timeout(&self) -> Duration {
    Duration::from_secs(self.build_timeout_secs)
  }

  pub fn upload_timeout(&self) -> Duration {
    Duration::from_secs(self.upload_timeout_secs)
  }
}
