//! Release command implementation
//!
//! Resolves the version, branch and settings, wires the real collaborators
//! (system git, the configured build command, scp/rsync, stdin prompts) into
//! the pipeline and runs it against the current directory.

use crate::core::config::Settings;
use crate::core::context::ReleaseRun;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::release::{Collaborators, ReleasePipeline, Version};
use crate::services::{CommandBuild, CommandUploader, StdinPrompt};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line inputs of one release
#[derive(Debug, Clone)]
pub struct ReleaseArgs {
  pub version: String,
  pub branch: Option<String>,
  pub settings: Option<PathBuf>,
  pub verbose: bool,
}

/// Run the release command
pub fn run_release(args: ReleaseArgs) -> ReleaseResult<()> {
  let version = Version::parse(&args.version)?;
  let root = env::current_dir()?;

  let settings = Settings::load(&root, args.settings.as_deref())?;
  let verbose = args.verbose || settings.verbose;
  init_logging(verbose);
  if let Some(source) = &settings.source {
    tracing::debug!(path = %source.display(), "loaded release settings");
  }

  let branch = args.branch.unwrap_or_else(|| settings.main_branch.clone());

  let git = SystemGit::open(&root, settings.remote.clone())?;
  tracing::debug!(current = %git.current_branch()?, "opened repository");

  let collab = Collaborators {
    vcs: Box::new(git),
    build: Box::new(CommandBuild::new(
      &root,
      settings.build_command.clone(),
      settings.build_timeout(),
    )),
    uploader: Arc::new(CommandUploader::new(settings.upload_timeout())),
    prompt: Box::new(StdinPrompt),
  };

  let run = ReleaseRun::new(version, branch, root)
    .dry_run(settings.dry_run)
    .parallel(settings.multi_threaded);

  let finished = ReleasePipeline::new(run, settings, collab)
    .with_progress(!verbose)
    .execute()?;
  tracing::info!(files = finished.modified.len(), "release {} complete", finished.version);
  Ok(())
}

/// `RUST_LOG` wins; otherwise debug when verbose, info when not. Logs go to
/// stderr so stdout carries only the stage announcements.
fn init_logging(verbose: bool) {
  let filter = if verbose { "debug" } else { "info" };
  let _ = tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
    .with(fmt::layer().without_time().with_target(false).with_writer(std::io::stderr))
    .try_init();
}
