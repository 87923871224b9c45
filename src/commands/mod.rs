//! CLI commands for release-train
//!
//! - **release**: cut a release of the project in the current directory

pub mod release;

pub use release::{ReleaseArgs, run_release};
