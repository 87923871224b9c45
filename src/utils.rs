//! Subprocess and path helpers

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run a command to completion, killing it once `timeout` elapses.
///
/// Output is inherited so long builds and transfers stream to the terminal.
/// Returns the exit status; a timeout is an error.
pub fn run_with_timeout(cmd: &mut Command, what: &str, timeout: Duration) -> ReleaseResult<ExitStatus> {
  tracing::info!(command = ?cmd, "running {}", what);
  let mut child = cmd.spawn().with_context(|| format!("Failed to start {}", what))?;
  let deadline = Instant::now() + timeout;

  loop {
    if let Some(status) = child.try_wait()? {
      return Ok(status);
    }
    if Instant::now() >= deadline {
      // Best effort: the child may have exited between try_wait and kill
      let _ = child.kill();
      let _ = child.wait();
      return Err(ReleaseError::Timeout {
        what: what.to_string(),
        after: timeout,
      });
    }
    thread::sleep(POLL_INTERVAL);
  }
}

/// Replace `path` with `contents` via a temporary file in the same directory.
///
/// The original is only replaced once the new content is fully written, and
/// keeps its permissions.
pub fn write_atomic(path: &Path, contents: &[u8]) -> ReleaseResult<()> {
  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  let mut tmp = NamedTempFile::new_in(dir).with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
  tmp.write_all(contents)?;
  tmp.as_file().sync_all()?;

  if let Ok(meta) = fs::metadata(path) {
    fs::set_permissions(tmp.path(), meta.permissions())?;
  }

  tmp.persist(path)?;
  Ok(())
}

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  // On Windows, convert backslashes to forward slashes
  // On Unix, this is a no-op since paths already use forward slashes
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
