//! External collaborators the release pipeline drives
//!
//! - **build**: the build/test toolchain invocation
//! - **upload**: scp/rsync transfers, plus the dry-run stand-in
//! - **prompt**: interactive confirmation
//!
//! Each sits behind a narrow trait so pipeline stages can run against fakes.

pub mod build;
pub mod prompt;
pub mod upload;

pub use build::{BuildInvoker, CommandBuild};
pub use prompt::{Prompt, StdinPrompt};
pub use upload::{CommandUploader, DryRunUploader, Uploader};
