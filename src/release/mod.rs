//! Release engine
//!
//! - **version**: validation and canonical form of the target version
//! - **scanner**: discovery of every build-configuration file in the tree
//! - **patcher**: in-place rewrite of version fields in those files
//! - **source**: rewrite of the version constants in the generated source file
//! - **archive**: extraction of the built distribution
//! - **tasks**: publication tasks and the serial/parallel task runner
//! - **pipeline**: the ordered stages from confirmation to the final tag

pub mod archive;
pub mod patcher;
pub mod pipeline;
pub mod scanner;
pub mod source;
pub mod tasks;
pub mod version;

pub use pipeline::{Collaborators, ReleasePipeline};
pub use version::Version;
