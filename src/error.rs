use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The runtime operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Create,
    Inspect,
    Start,
    Build,
    Copy,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Create => "create",
            Step::Inspect => "inspect",
            Step::Start => "start",
            Step::Build => "build",
            Step::Copy => "copy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{step}: {} does not exist", path.display())]
    MissingPath { step: Step, path: PathBuf },

    #[error("{step}: failed to invoke `{program}`: {source}")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step}: runtime exited with {}: {stderr}", exit_label(*code))]
    Failed {
        step: Step,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{step}: timed out after {secs}s")]
    TimedOut { step: Step, secs: u64 },

    #[error("{step}: runtime returned no output")]
    EmptyOutput { step: Step },

    #[error("inspect: container {id} resolved to an empty name")]
    EmptyName { id: String },
}

impl RunError {
    /// The step that failed, if the failure happened after validation.
    pub fn step(&self) -> Option<Step> {
        match self {
            RunError::InvalidRequest(_) | RunError::InvalidConfig(_) => None,
            RunError::MissingPath { step, .. }
            | RunError::Spawn { step, .. }
            | RunError::Failed { step, .. }
            | RunError::TimedOut { step, .. }
            | RunError::EmptyOutput { step } => Some(*step),
            RunError::EmptyName { .. } => Some(Step::Inspect),
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code".to_string(),
    }
}
