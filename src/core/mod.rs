//! Core building blocks shared by every release stage
//!
//! - **config**: release settings (release.toml) discovery and validation
//! - **context**: the per-invocation `ReleaseRun` handed to each stage
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: git operations abstraction (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
