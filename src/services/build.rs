//! Build/test invocation

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::release::version::Version;
use crate::utils::run_with_timeout;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Runs the external build for a patched tree; any failure is fatal
pub trait BuildInvoker {
  fn build_distribution(&self, version: &Version) -> ReleaseResult<()>;
}

/// Build driven by a configured command line, run in the project root
pub struct CommandBuild {
  root: PathBuf,
  command: Vec<String>,
  timeout: Duration,
}

impl CommandBuild {
  pub fn new(root: impl Into<PathBuf>, command: Vec<String>, timeout: Duration) -> Self {
    Self {
      root: root.into(),
      command,
      timeout,
    }
  }
}

impl BuildInvoker for CommandBuild {
  fn build_distribution(&self, version: &Version) -> ReleaseResult<()> {
    let Some((program, args)) = self.command.split_first() else {
      return Err(ReleaseError::Build {
        reason: "no build command configured".to_string(),
      });
    };

    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(&self.root).env("RELEASE_VERSION", version.as_str());

    let status = run_with_timeout(&mut cmd, "build", self.timeout).map_err(|e| match e {
      ReleaseError::Timeout { .. } => e,
      other => ReleaseError::Build {
        reason: other.to_string(),
      },
    })?;

    if !status.success() {
      return Err(ReleaseError::Build {
        reason: format!("`{}` exited with {}", self.command.join(" "), status),
      });
    }

    Ok(())
  }
}
