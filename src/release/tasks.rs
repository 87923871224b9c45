//! Publication tasks and the task runner
//!
//! Each [`PublicationTask`] publishes one artifact family to one destination.
//! The [`TaskRunner`] either runs a task on the spot (serial mode) or holds it
//! until [`TaskRunner::join`], which starts every held task at once on its own
//! worker and waits for all of them. Tasks never talk to each other; only
//! their terminal status comes back.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::release::version::Version;
use crate::services::Uploader;
use crate::utils::run_with_timeout;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

/// What a task publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFamily {
  /// API docs, rsync'ed under `<MAJOR.MINOR>/apidocs`
  Documentation,
  /// Every distribution zip, scp'ed as a `<version>/` directory
  Distribution,
  /// Configuration schema files, rsync'ed flat
  Schema,
}

impl fmt::Display for ArtifactFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ArtifactFamily::Documentation => write!(f, "documentation"),
      ArtifactFamily::Distribution => write!(f, "distribution"),
      ArtifactFamily::Schema => write!(f, "schema"),
    }
  }
}

/// Local inputs shared by every task of a run
#[derive(Debug, Clone)]
pub struct PublishLayout {
  pub root: PathBuf,
  pub dist_dir: PathBuf,
  /// Root of the extracted distribution archive
  pub extracted: PathBuf,
  pub version: Version,
  /// Absolute path of the docs tracker-fixup script, if any
  pub tracker_script: Option<PathBuf>,
  pub rsync_flags: Vec<String>,
  pub script_timeout: Duration,
}

impl PublishLayout {
  /// Staging area for the binary upload, cleared before and after use
  pub fn staging_dir(&self) -> PathBuf {
    self.root.join(".tmp")
  }
}

/// One artifact family bound for one destination
#[derive(Debug, Clone)]
pub struct PublicationTask {
  pub name: String,
  pub family: ArtifactFamily,
  pub destination: String,
  layout: Arc<PublishLayout>,
}

impl PublicationTask {
  pub fn new(family: ArtifactFamily, destination: impl Into<String>, layout: Arc<PublishLayout>) -> Self {
    Self {
      name: family.to_string(),
      family,
      destination: destination.into(),
      layout,
    }
  }

  /// Stage the artifacts locally and hand them to the uploader
  pub fn execute(&self, uploader: &dyn Uploader) -> ReleaseResult<()> {
    tracing::info!(task = %self.name, destination = %self.destination, "publishing");
    match self.family {
      ArtifactFamily::Documentation => self.publish_docs(uploader),
      ArtifactFamily::Distribution => self.publish_distribution(uploader),
      ArtifactFamily::Schema => self.publish_schema(uploader),
    }
  }

  fn publish_docs(&self, uploader: &dyn Uploader) -> ReleaseResult<()> {
    let layout = &self.layout;
    let doc_dir = layout.extracted.join("doc");

    if let Some(script) = &layout.tracker_script {
      let mut cmd = Command::new(script);
      cmd.current_dir(&doc_dir);
      let status = run_with_timeout(&mut cmd, "docs tracker script", layout.script_timeout)?;
      if !status.success() {
        return Err(ReleaseError::message(format!(
          "{} exited with {}",
          script.display(),
          status
        )));
      }
    }

    let short = doc_dir.join(layout.version.major_minor());
    if short.exists() {
      fs::remove_dir_all(&short).with_context(|| format!("Failed to remove {}", short.display()))?;
    }
    fs::create_dir_all(&short)?;

    let apidocs = doc_dir.join("apidocs");
    fs::rename(&apidocs, short.join("apidocs"))
      .with_context(|| format!("Failed to move {} into {}", apidocs.display(), short.display()))?;

    uploader.upload_rsync(&short, &self.destination, &layout.rsync_flags)
  }

  fn publish_distribution(&self, uploader: &dyn Uploader) -> ReleaseResult<()> {
    let layout = &self.layout;
    let staging = layout.staging_dir();
    let target = staging.join(layout.version.as_str());

    if staging.exists() {
      fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&target)?;

    println!("   Copying from {} to {}", layout.dist_dir.display(), target.display());
    let copied = copy_zips(&layout.dist_dir, &target)?;
    tracing::debug!(copied, "staged distribution archives");

    let result = uploader.upload_scp(&target, &self.destination);
    fs::remove_dir_all(&staging)?;
    result
  }

  fn publish_schema(&self, uploader: &dyn Uploader) -> ReleaseResult<()> {
    let schema_dir = self.layout.extracted.join("etc").join("schema");
    if !schema_dir.is_dir() {
      return Err(ReleaseError::message(format!(
        "Schema directory not found: {}",
        schema_dir.display()
      )));
    }
    // Trailing "." sends the directory's contents, not the directory
    uploader.upload_rsync(&schema_dir.join("."), &self.destination, &self.layout.rsync_flags)
  }
}

/// Copy every `*.zip` file directly under `from` into `to`
fn copy_zips(from: &Path, to: &Path) -> ReleaseResult<usize> {
  let mut copied = 0;
  for entry in fs::read_dir(from).with_context(|| format!("Failed to read {}", from.display()))? {
    let entry = entry?;
    let name = entry.file_name();
    let is_zip = name.to_string_lossy().trim().to_lowercase().ends_with(".zip");
    if is_zip && entry.file_type()?.is_file() {
      fs::copy(entry.path(), to.join(&name))?;
      copied += 1;
    }
  }
  Ok(copied)
}

/// Terminal state of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
  pub name: String,
  pub result: Result<(), String>,
}

/// Runs publication tasks serially or as one concurrent batch
pub struct TaskRunner {
  parallel: bool,
  uploader: Arc<dyn Uploader>,
  scheduled: Vec<PublicationTask>,
  completed: Vec<TaskOutcome>,
}

impl TaskRunner {
  pub fn new(parallel: bool, uploader: Arc<dyn Uploader>) -> Self {
    Self {
      parallel,
      uploader,
      scheduled: Vec::new(),
      completed: Vec::new(),
    }
  }

  /// Serial: run now and fail fast. Parallel: hold until `join`.
  pub fn run(&mut self, task: PublicationTask) -> ReleaseResult<()> {
    if self.parallel {
      tracing::debug!(task = %task.name, "scheduled");
      self.scheduled.push(task);
      return Ok(());
    }

    let result = task.execute(self.uploader.as_ref());
    match result {
      Ok(()) => {
        self.completed.push(TaskOutcome {
          name: task.name,
          result: Ok(()),
        });
        Ok(())
      }
      Err(e) => Err(ReleaseError::Publication {
        failures: vec![(task.name, e.to_string())],
      }),
    }
  }

  /// Number of tasks waiting for `join`
  pub fn pending(&self) -> usize {
    self.scheduled.len()
  }

  /// Start every scheduled task, wait for all of them, report every outcome.
  ///
  /// Any failure fails the batch, even when siblings succeeded.
  pub fn join(self) -> ReleaseResult<Vec<TaskOutcome>> {
    let TaskRunner {
      uploader,
      scheduled,
      mut completed,
      ..
    } = self;

    if !scheduled.is_empty() {
      let pool = ThreadPoolBuilder::new()
        .num_threads(scheduled.len())
        .thread_name(|i| format!("publish-{}", i))
        .build()?;

      let outcomes: Vec<TaskOutcome> = pool.install(|| {
        scheduled
          .par_iter()
          .map(|task| TaskOutcome {
            name: task.name.clone(),
            result: task.execute(uploader.as_ref()).map_err(|e| e.to_string()),
          })
          .collect()
      });
      completed.extend(outcomes);
    }

    let failures: Vec<(String, String)> = completed
      .iter()
      .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.clone(), e.clone())))
      .collect();
    if !failures.is_empty() {
      return Err(ReleaseError::Publication { failures });
    }

    Ok(completed)
  }
}
