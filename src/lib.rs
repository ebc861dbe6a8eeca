//! Build images, ship files, and run containers on local or remote Docker hosts.
//!
//! Every runtime interaction is an argument vector handed to the `docker`
//! client through an [`exec::Executor`]; nothing is interpreted by a shell.

pub mod config;
pub mod error;
pub mod exec;
pub mod helpers;
pub mod logging;
pub mod process;
pub mod run;

pub use error::{RunError, Step};
pub use exec::{Executor, Target};
pub use helpers::{BuildRequest, CopyRequest, build_image, copy_files};
pub use run::{RunEvent, RunOutcome, RunRequest, run_container};
