//! Error types for release-train with contextual messages and exit codes
//!
//! Every fatal condition in the pipeline ends up as a [`ReleaseError`]. The
//! variant decides the process exit status and, where one exists, a hint that
//! is printed under the message.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Exit codes for release-train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Generic fatal error or user abort
  Fatal = 1,
  /// Target branch does not exist on the upstream remote
  BranchNotFound = 100,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-train
#[derive(Debug)]
pub enum ReleaseError {
  /// Version string does not match MAJOR.MINOR.MICRO.QUALIFIER
  InvalidVersion { input: String },

  /// Branch to release from is missing on the upstream remote
  BranchNotFound { branch: String, remote: String },

  /// A configuration file could not be parsed
  Parse { path: PathBuf, reason: String },

  /// External build/test invocation failed
  Build { reason: String },

  /// One or more publication tasks failed (task name, reason)
  Publication { failures: Vec<(String, String)> },

  /// A subprocess exceeded its deadline and was killed
  Timeout { what: String, after: Duration },

  /// User declined a confirmation prompt
  Aborted,

  /// Settings errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(e) => ReleaseError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::BranchNotFound { .. } => ExitCode::BranchNotFound,
      _ => ExitCode::Fatal,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::InvalidVersion { .. } => {
        Some("Versions look like MAJOR.MINOR.MICRO.QUALIFIER, e.g. 4.1.1.BETA1 or 5.2.0.FINAL".to_string())
      }
      ReleaseError::BranchNotFound { branch, remote } => Some(format!(
        "Push '{}' to '{}' first, or pass the branch to release from as the second argument.",
        branch, remote
      )),
      ReleaseError::Parse { .. } => {
        Some("Fix the file and re-run; nothing has been committed yet.".to_string())
      }
      ReleaseError::Build { .. } => Some(
        "The version bump is committed on the transient release branch only. No tag was created.".to_string(),
      ),
      ReleaseError::Publication { .. } => Some(
        "Artifacts from successful tasks stay uploaded. Re-publish the failed ones by hand before tagging."
          .to_string(),
      ),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::InvalidVersion { input } => write!(f, "Invalid version '{}'", input),
      ReleaseError::BranchNotFound { branch, remote } => {
        write!(f, "Branch {} cannot be found on upstream repository '{}'. Aborting!", branch, remote)
      }
      ReleaseError::Parse { path, reason } => {
        write!(f, "Failed to parse {}: {}", path.display(), reason)
      }
      ReleaseError::Build { reason } => write!(f, "Build failed: {}", reason),
      ReleaseError::Publication { failures } => {
        write!(f, "{} publication task(s) failed:", failures.len())?;
        for (name, reason) in failures {
          write!(f, "\n  - {}: {}", name, reason)?;
        }
        Ok(())
      }
      ReleaseError::Timeout { what, after } => {
        write!(f, "{} did not finish within {}s and was killed", what, after.as_secs())
      }
      ReleaseError::Aborted => write!(f, "... User Abort!"),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<regex::Error> for ReleaseError {
  fn from(err: regex::Error) -> Self {
    ReleaseError::message(format!("Regex error: {}", err))
  }
}

impl From<zip::result::ZipError> for ReleaseError {
  fn from(err: zip::result::ZipError) -> Self {
    ReleaseError::message(format!("Archive error: {}", err))
  }
}

impl From<tempfile::PersistError> for ReleaseError {
  fn from(err: tempfile::PersistError) -> Self {
    ReleaseError::Io(err.error)
  }
}

impl From<rayon::ThreadPoolBuildError> for ReleaseError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    ReleaseError::message(format!("Failed to start publication workers: {}", err))
  }
}

impl From<walkdir::Error> for ReleaseError {
  fn from(err: walkdir::Error) -> Self {
    ReleaseError::message(format!("Directory walk failed: {}", err))
  }
}

/// Settings errors
#[derive(Debug)]
pub enum ConfigError {
  /// No settings file in any searched location
  NotFound { searched: Vec<PathBuf> },

  /// Settings file present but unusable
  Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some(
        "Create release.toml in the project root (or pass --settings) with at least a [destinations] table."
          .to_string(),
      ),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { searched } => {
        write!(f, "No release settings found. Searched:")?;
        for path in searched {
          write!(f, "\n  {}", path.display())?;
        }
        Ok(())
      }
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid settings in {}: {}", path.display(), reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Push failed
  PushFailed {
    remote: String,
    refspec: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("permission denied") || reason.contains("403") {
          Some("Check your SSH key and push access to the upstream repository.".to_string())
        } else if reason.contains("already exists") {
          Some("The tag exists upstream already. Delete it there or pick a new version.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run release-train from the root of a git clone (looked at {})",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::PushFailed {
        remote,
        refspec,
        reason,
      } => {
        write!(f, "Push of {} to {} failed: {}", refspec, remote, reason)
      }
    }
  }
}

/// Result type alias for release-train
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print a fatal error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  match error {
    ReleaseError::Aborted => eprintln!("\n⚠️  {}\n", error),
    _ => eprintln!("\n❌ FATAL: {}\n", error),
  }

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
