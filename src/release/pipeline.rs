//! Release pipeline orchestrator
//!
//! Stages run strictly in order and any failure ends the run:
//!
//! ```text
//! Confirm → Tag → PatchVersions → Build → Unpack → PublishAll → Finalize
//! ```
//!
//! The permanent tag is only created in Finalize, after the build and every
//! publication task succeeded. In dry-run mode uploads go to
//! [`DryRunUploader`] and the tag is neither pushed nor is the transient
//! branch deleted; local patching and committing still happen.

use crate::core::config::Settings;
use crate::core::context::ReleaseRun;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::VersionControl;
use crate::release::tasks::{ArtifactFamily, PublicationTask, PublishLayout, TaskRunner};
use crate::release::version::Version;
use crate::release::{archive, patcher, scanner, source};
use crate::services::{BuildInvoker, DryRunUploader, Prompt, Uploader};
use crate::ui::progress::FileProgress;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Confirm,
  Tag,
  PatchVersions,
  Build,
  Unpack,
  PublishAll,
  Finalize,
}

impl Stage {
  /// Step number announced on the console
  fn number(self) -> usize {
    match self {
      Stage::Confirm => 1,
      Stage::Tag => 2,
      Stage::PatchVersions => 3,
      Stage::Build => 4,
      Stage::Unpack => 5,
      Stage::PublishAll => 6,
      Stage::Finalize => 7,
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let title = match self {
      Stage::Confirm => "Confirming release",
      Stage::Tag => "Creating release branch",
      Stage::PatchVersions => "Updating version numbers",
      Stage::Build => "Building and testing distribution",
      Stage::Unpack => "Unpacking distribution",
      Stage::PublishAll => "Publishing artifacts",
      Stage::Finalize => "Tagging release",
    };
    write!(f, "{}", title)
  }
}

/// External collaborators the pipeline drives
pub struct Collaborators {
  pub vcs: Box<dyn VersionControl>,
  pub build: Box<dyn BuildInvoker>,
  /// Live uploader; replaced by [`DryRunUploader`] on dry runs
  pub uploader: Arc<dyn Uploader>,
  pub prompt: Box<dyn Prompt>,
}

pub struct ReleasePipeline {
  run: ReleaseRun,
  settings: Settings,
  collab: Collaborators,
  show_progress: bool,
}

impl ReleasePipeline {
  pub fn new(run: ReleaseRun, settings: Settings, collab: Collaborators) -> Self {
    Self {
      run,
      settings,
      collab,
      show_progress: false,
    }
  }

  /// Draw a progress bar during PatchVersions (terminal permitting)
  pub fn with_progress(mut self, show: bool) -> Self {
    self.show_progress = show;
    self
  }

  /// Run every stage; returns the finished run context
  pub fn execute(mut self) -> ReleaseResult<ReleaseRun> {
    self.stage(Stage::Confirm, |p| p.confirm())?;
    self.stage(Stage::Tag, |p| p.tag())?;
    self.stage(Stage::PatchVersions, |p| p.patch_versions())?;
    self.stage(Stage::Build, |p| p.build())?;
    let extracted = self.stage(Stage::Unpack, |p| p.unpack())?;
    self.stage(Stage::PublishAll, |p| p.publish_all(extracted))?;
    self.stage(Stage::Finalize, |p| p.finalize())?;

    self.print_reminder();
    Ok(self.run)
  }

  fn stage<T>(&mut self, stage: Stage, body: impl FnOnce(&mut Self) -> ReleaseResult<T>) -> ReleaseResult<T> {
    println!("\nStep {}: {}", stage.number(), stage);
    let value = body(self)?;
    println!("Step {}: Complete", stage.number());
    Ok(value)
  }

  fn confirm(&mut self) -> ReleaseResult<()> {
    let run = &self.run;
    println!("🚀 Releasing {} from branch {}", run.version, run.branch);
    println!("   Dry run:          {}", run.dry_run);
    println!("   Parallel publish: {}", run.parallel);
    println!("   Project root:     {}", run.root.display());

    let question = format!("Are you sure you want to release {}?", run.version);
    if !self.collab.prompt.confirm(&question)? {
      return Err(ReleaseError::Aborted);
    }

    if !self.collab.vcs.is_upstream_clone(&self.settings.upstream_url)? {
      println!(
        "\n⚠️  The {} remote does not look like {}.",
        self.settings.remote, self.settings.upstream_url
      );
      println!("   Tags pushed from a fork never reach the real project.");
      if !self.collab.prompt.confirm("Do you want to continue anyway?")? {
        return Err(ReleaseError::Aborted);
      }
    }

    Ok(())
  }

  fn tag(&mut self) -> ReleaseResult<()> {
    let branch = self.run.branch.clone();
    if !self.collab.vcs.remote_branch_exists(&branch)? {
      return Err(ReleaseError::BranchNotFound {
        branch,
        remote: self.settings.remote.clone(),
      });
    }

    self.collab.vcs.switch_to_branch(&branch)?;
    let working = self.run.working_branch();
    self.collab.vcs.create_tag_branch(&working)?;
    println!("   Working on transient branch {}", working);
    Ok(())
  }

  fn patch_versions(&mut self) -> ReleaseResult<()> {
    let root = self.run.root.clone();
    let version = self.run.version.clone();

    let files = scanner::scan(&root, &self.settings.config_file_name, &self.settings.scan_exclude)?;
    println!("   Found {} {} files", files.len(), self.settings.config_file_name);

    let progress = FileProgress::for_terminal(self.show_progress, files.len(), "Patching");
    let (patched, untouched) = patch_files(files, &version, progress)?;
    for file in patched {
      self.run.record_modified(file);
    }
    // The bar is finished by now, so warnings land on their own lines
    for file in &untouched {
      tracing::warn!("{} declares no version; left untouched", file.display());
    }

    let source_file = root.join(&self.settings.version_source);
    source::patch_source(&source_file, &version)?;
    self.run.record_modified(source_file);

    println!("   Committing {} modified files", self.run.modified.len());
    let message = format!("Release Script: update versions for {}", version);
    self.collab.vcs.commit(&self.run.modified, &message)
  }

  fn build(&mut self) -> ReleaseResult<()> {
    self.collab.build.build_distribution(&self.run.version)
  }

  fn dist_dir(&self) -> PathBuf {
    self.run.root.join(&self.settings.distribution_dir)
  }

  fn unpack(&mut self) -> ReleaseResult<PathBuf> {
    let extracted = archive::unpack(&self.dist_dir(), &self.settings.project_name, &self.run.version)?;
    println!("   Extracted to {}", extracted.display());
    Ok(extracted)
  }

  fn publish_all(&mut self, extracted: PathBuf) -> ReleaseResult<()> {
    let layout = Arc::new(PublishLayout {
      root: self.run.root.clone(),
      dist_dir: self.dist_dir(),
      extracted,
      version: self.run.version.clone(),
      tracker_script: self
        .settings
        .docs_tracker_script
        .as_ref()
        .map(|script| self.run.root.join(script)),
      rsync_flags: self.settings.rsync_flags.clone(),
      script_timeout: self.settings.upload_timeout(),
    });

    let uploader: Arc<dyn Uploader> = if self.run.dry_run {
      Arc::new(DryRunUploader)
    } else {
      self.collab.uploader.clone()
    };

    let destinations = &self.settings.destinations;
    let tasks = [
      (ArtifactFamily::Documentation, &destinations.docs),
      (ArtifactFamily::Distribution, &destinations.binaries),
      (ArtifactFamily::Schema, &destinations.schema),
    ];

    let mut runner = TaskRunner::new(self.run.parallel, uploader);
    for (family, destination) in tasks {
      let task = PublicationTask::new(family, destination.clone(), layout.clone());
      if self.run.parallel {
        println!("   Scheduled {} upload to {}", family, destination);
      } else {
        println!("   Uploading {} to {}", family, destination);
      }
      runner.run(task)?;
    }

    if runner.pending() > 0 {
      println!("   Waiting for {} uploads", runner.pending());
    }
    for outcome in runner.join()? {
      println!("   ✅ {}", outcome.name);
    }
    Ok(())
  }

  fn finalize(&mut self) -> ReleaseResult<()> {
    let tag = self.run.tag_name();
    let message = format!(
      "Release {} ({})",
      self.run.version,
      chrono::Local::now().format("%Y-%m-%d")
    );
    self.collab.vcs.tag_for_release(&tag, &message)?;

    let working = self.run.working_branch();
    if self.run.dry_run {
      println!("   🔍 [dry run] Not pushing {} to {}", tag, self.settings.remote);
      println!("   🔍 [dry run] Branch {} left behind for inspection", working);
    } else {
      self.collab.vcs.push_to_origin(&tag)?;
      self.collab.vcs.cleanup(&self.run.branch, &working)?;
    }
    Ok(())
  }

  fn print_reminder(&self) {
    println!("\n✅ Released {}", self.run.version);
    println!("\n💡 Remaining manual steps:");
    println!("   1. Release the version in the issue tracker");
    println!("   2. Update the project site and documentation links");
    println!("   3. Announce the release");
    println!("   4. Bump the development version on {}", self.run.branch);
  }
}

/// Patch every file while ticking `progress`, which is dropped on return.
///
/// Returns the files that declare a version and those that declare none.
fn patch_files(
  files: Vec<PathBuf>,
  version: &Version,
  mut progress: Option<FileProgress>,
) -> ReleaseResult<(Vec<PathBuf>, Vec<PathBuf>)> {
  let mut patched = Vec::new();
  let mut untouched = Vec::new();
  for file in files {
    if patcher::patch(&file, version)? {
      tracing::debug!(" ... patched {}", file.display());
      patched.push(file);
    } else {
      untouched.push(file);
    }
    if let Some(bar) = progress.as_mut() {
      bar.inc();
    }
  }
  Ok((patched, untouched))
}
