pub mod commands;
pub mod orchestrator;
mod types;

pub use orchestrator::run_container;
pub use types::{RunEvent, RunOutcome, RunRequest};
