//! Where runtime commands execute.
//!
//! An [`Executor`] is chosen once per invocation from the optional target and
//! every runtime operation of that invocation goes through it. The local
//! executor talks to the Docker daemon the client is configured for; the
//! remote executor points the client at another host with `--host`, so the
//! argument vector reaches the remote daemon unchanged.

mod local;
mod remote;

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{RunError, Step};
use crate::process::{self, OutputLine, ProcessCommand, ProcessResult};

pub use local::LocalExecutor;
pub use remote::RemoteExecutor;
pub(crate) use remote::{validate_host, validate_user};

/// The host runtime commands are issued against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local,
    Remote(String),
}

impl Target {
    /// `None` or a blank string means local.
    pub fn from_option(host: Option<&str>) -> Self {
        match host.map(str::trim) {
            Some(h) if !h.is_empty() => Target::Remote(h.to_string()),
            _ => Target::Local,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local => f.write_str("local"),
            Target::Remote(host) => f.write_str(host),
        }
    }
}

/// Capability to run container-runtime commands on one target.
pub trait Executor {
    fn target(&self) -> &Target;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Run a runtime command and return its trimmed stdout.
    ///
    /// Non-zero exit, timeout, or failure to launch are errors for `step`.
    fn capture(&self, step: Step, args: Vec<String>) -> Result<String, RunError>;

    /// Run a runtime command, relaying its output lines as they arrive.
    ///
    /// Only a failure to launch is an error; the exit status is returned for
    /// the caller to judge.
    fn relay(
        &self,
        step: Step,
        args: Vec<String>,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<ProcessResult, RunError>;
}

/// Timeouts shared by both executors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub command: Option<Duration>,
    pub attach: Option<Duration>,
}

impl Timeouts {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            command: cfg.command_timeout(),
            attach: cfg.attach_timeout(),
        }
    }
}

/// Pick the executor for `target`.
pub fn select(target: &Target, cfg: &Config) -> Result<Box<dyn Executor>, RunError> {
    let docker = cfg.docker_command().map_err(RunError::InvalidConfig)?;
    let timeouts = Timeouts::from_config(cfg);
    let executor: Box<dyn Executor> = match target {
        Target::Local => Box::new(LocalExecutor::new(docker, timeouts)),
        Target::Remote(host) => Box::new(RemoteExecutor::new(
            docker,
            host,
            cfg.remote_scheme,
            cfg.remote_user.as_deref(),
            cfg.remote_port,
            timeouts,
        )?),
    };
    debug!(target: "dockr.exec", host = %executor.target(), "executor selected");
    Ok(executor)
}

/// Assemble a runtime invocation: `<program> <leading...> <args...>`.
pub(crate) fn runtime_command(
    base: &[String],
    args: Vec<String>,
    timeout: Option<Duration>,
) -> ProcessCommand {
    // Config::docker_command never yields an empty base.
    let mut words = base.iter();
    let program = words.next().map_or("docker", String::as_str);
    ProcessCommand::new(program)
        .args(words.cloned())
        .args(args)
        .timeout(timeout)
}

pub(crate) fn run_captured(step: Step, cmd: ProcessCommand) -> Result<String, RunError> {
    debug!(target: "dockr.exec", %step, command = %cmd.display(), "run");
    let timeout = cmd.timeout;
    let program = cmd.program.clone();
    let result = process::capture(cmd).map_err(|source| RunError::Spawn {
        step,
        program,
        source,
    })?;
    check(step, &result, timeout)?;
    Ok(result.stdout.trim().to_string())
}

pub(crate) fn launch(
    step: Step,
    cmd: ProcessCommand,
    on_line: &mut dyn FnMut(OutputLine),
) -> Result<ProcessResult, RunError> {
    debug!(target: "dockr.exec", %step, command = %cmd.display(), "run");
    let program = cmd.program.clone();
    process::relay(cmd, on_line).map_err(|source| RunError::Spawn {
        step,
        program,
        source,
    })
}

/// Turn a finished process into an error unless it exited cleanly.
pub(crate) fn check(
    step: Step,
    result: &ProcessResult,
    timeout: Option<Duration>,
) -> Result<(), RunError> {
    if result.timed_out {
        let secs = timeout.map_or(0, |t| t.as_secs());
        return Err(RunError::TimedOut { step, secs });
    }
    if !result.success {
        return Err(RunError::Failed {
            step,
            code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(())
}
