//! Artifact transfers to remote destinations

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::utils::run_with_timeout;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Transfers local artifacts to a remote destination.
///
/// Publication tasks call this from worker threads, hence `Send + Sync`.
pub trait Uploader: Send + Sync {
  fn upload_scp(&self, source: &Path, destination: &str) -> ReleaseResult<()>;

  fn upload_rsync(&self, source: &Path, destination: &str, flags: &[String]) -> ReleaseResult<()>;
}

/// Live uploader: shells out to `scp` and `rsync`
pub struct CommandUploader {
  timeout: Duration,
}

impl CommandUploader {
  pub fn new(timeout: Duration) -> Self {
    Self { timeout }
  }

  fn transfer(&self, mut cmd: Command, what: &str) -> ReleaseResult<()> {
    let status = run_with_timeout(&mut cmd, what, self.timeout)?;
    if !status.success() {
      return Err(ReleaseError::message(format!("{} exited with {}", what, status)));
    }
    Ok(())
  }
}

impl Uploader for CommandUploader {
  fn upload_scp(&self, source: &Path, destination: &str) -> ReleaseResult<()> {
    let mut cmd = Command::new("scp");
    cmd.arg("-r").arg(source).arg(destination);
    self.transfer(cmd, &format!("scp of {}", source.display()))
  }

  fn upload_rsync(&self, source: &Path, destination: &str, flags: &[String]) -> ReleaseResult<()> {
    let mut cmd = Command::new("rsync");
    cmd.args(flags).arg(source).arg(destination);
    self.transfer(cmd, &format!("rsync of {}", source.display()))
  }
}

/// Dry-run stand-in: reports what would be transferred and does nothing
pub struct DryRunUploader;

impl Uploader for DryRunUploader {
  fn upload_scp(&self, source: &Path, destination: &str) -> ReleaseResult<()> {
    println!("   🔍 [dry run] scp -r {} {}", source.display(), destination);
    Ok(())
  }

  fn upload_rsync(&self, source: &Path, destination: &str, flags: &[String]) -> ReleaseResult<()> {
    println!(
      "   🔍 [dry run] rsync {} {} {}",
      flags.join(" "),
      source.display(),
      destination
    );
    Ok(())
  }
}
