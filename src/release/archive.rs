//! Distribution archive extraction (the Unpack stage)

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::release::version::Version;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// `infinispan-4.1.1.BETA1-all.zip`
pub fn archive_name(project: &str, version: &Version) -> String {
  format!("{}-{}-all.zip", project, version)
}

/// `infinispan-4.1.1.BETA1`, the top-level directory inside the archive
pub fn extracted_dir_name(project: &str, version: &Version) -> String {
  format!("{}-{}", project, version)
}

/// Extract the release archive inside `dist_dir` and return the extracted root.
///
/// A previously extracted directory of the same name is removed first so a
/// re-run never mixes old and new files.
pub fn unpack(dist_dir: &Path, project: &str, version: &Version) -> ReleaseResult<PathBuf> {
  let archive_path = dist_dir.join(archive_name(project, version));
  if !archive_path.is_file() {
    return Err(ReleaseError::with_help(
      format!("Distribution archive not found: {}", archive_path.display()),
      "Check distribution_dir and project_name in the release settings.",
    ));
  }

  let extracted = dist_dir.join(extracted_dir_name(project, version));
  if extracted.exists() {
    tracing::debug!("removing stale {}", extracted.display());
    fs::remove_dir_all(&extracted).with_context(|| format!("Failed to remove {}", extracted.display()))?;
  }

  let file = File::open(&archive_path).with_context(|| format!("Failed to open {}", archive_path.display()))?;
  let mut archive = ZipArchive::new(file)?;
  tracing::info!(entries = archive.len(), "extracting {}", archive_path.display());
  archive.extract(dist_dir)?;

  if !extracted.is_dir() {
    return Err(ReleaseError::message(format!(
      "{} does not contain a top-level {}/ directory",
      archive_path.display(),
      extracted_dir_name(project, version)
    )));
  }

  Ok(extracted)
}
