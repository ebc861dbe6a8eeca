// One-shot dispatchers that prepare a target before `run`.

pub mod build;
pub mod copy;

pub use build::{BuildRequest, build_image};
pub use copy::{CopyRequest, CopySettings, copy_files};
