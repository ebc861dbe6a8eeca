// External process plumbing: argument vectors in, streamed lines and exit status out.

pub mod run;
pub mod types;

pub use run::{capture, relay, spawn};
pub use types::{OutputLine, ProcessCommand, ProcessResult};
