use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, RemoteScheme};
use crate::error::{RunError, Step};
use crate::exec::{check, launch, validate_host, validate_user};
use crate::process::{OutputLine, ProcessCommand};

/// Files to ship to a remote host ahead of a build or run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub target: String,
    pub sources: Vec<PathBuf>,
    pub destination: String,
}

/// How copies are dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySettings {
    /// Copy program plus leading arguments, e.g. `["scp", "-r"]`.
    pub command: Vec<String>,
    pub user: Option<String>,
    /// SSH port, passed as `-P <port>`.
    pub port: Option<u16>,
    pub timeout: Option<Duration>,
}

impl CopySettings {
    pub fn from_config(cfg: &Config) -> Result<Self, RunError> {
        if let Some(user) = cfg.remote_user.as_deref() {
            validate_user(user)?;
        }
        Ok(Self {
            command: cfg.copy_command().map_err(RunError::InvalidConfig)?,
            user: cfg.remote_user.clone(),
            port: match cfg.remote_scheme {
                RemoteScheme::Ssh => cfg.remote_port,
                RemoteScheme::Tcp => None,
            },
            timeout: cfg.attach_timeout(),
        })
    }
}

/// `[user@]host:destination`, bracketing IPv6 literals.
pub fn remote_path(target: &str, user: Option<&str>, destination: &str) -> String {
    let host = if target.contains(':') && !target.starts_with('[') {
        format!("[{target}]")
    } else {
        target.to_string()
    };
    match user {
        Some(u) => format!("{u}@{host}:{destination}"),
        None => format!("{host}:{destination}"),
    }
}

/// One copy invocation per source:
/// `<command...> [-P <port>] -- <source> <remote-path>`.
pub fn copy_commands(settings: &CopySettings, req: &CopyRequest) -> Vec<ProcessCommand> {
    let dest = remote_path(&req.target, settings.user.as_deref(), &req.destination);
    let mut words = settings.command.iter();
    let program = words.next().map_or("scp", String::as_str);
    let port = settings
        .port
        .map(|p| vec!["-P".to_string(), p.to_string()])
        .unwrap_or_default();
    req.sources
        .iter()
        .map(|src| {
            ProcessCommand::new(program)
                .args(words.clone().cloned())
                .args(port.iter().cloned())
                .args(["--".to_string(), src.display().to_string(), dest.clone()])
                .timeout(settings.timeout)
        })
        .collect()
}

/// Copy every source to the target in order, stopping at the first failure.
///
/// All sources are checked locally before anything is dispatched. Returns the
/// number of sources copied.
pub fn copy_files(
    settings: &CopySettings,
    req: &CopyRequest,
    on_line: &mut dyn FnMut(OutputLine),
) -> Result<usize, RunError> {
    validate_host(&req.target)?;
    if let Some(user) = settings.user.as_deref() {
        validate_user(user)?;
    }
    if req.sources.is_empty() {
        return Err(RunError::InvalidRequest("no source paths given".into()));
    }
    if req.destination.trim().is_empty() {
        return Err(RunError::InvalidRequest("destination path is empty".into()));
    }
    if let Some(missing) = req.sources.iter().find(|p| !p.exists()) {
        return Err(RunError::MissingPath {
            step: Step::Copy,
            path: missing.clone(),
        });
    }

    let commands = copy_commands(settings, req);
    info!(
        target: "dockr.helpers",
        host = %req.target,
        count = commands.len(),
        destination = %req.destination,
        "copying files"
    );
    for cmd in commands {
        let timeout = cmd.timeout;
        let result = launch(Step::Copy, cmd, on_line)?;
        check(Step::Copy, &result, timeout)?;
    }
    debug!(target: "dockr.helpers", host = %req.target, "copy complete");
    Ok(req.sources.len())
}
