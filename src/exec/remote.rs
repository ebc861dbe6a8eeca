use crate::config::RemoteScheme;
use crate::error::{RunError, Step};
use crate::process::{OutputLine, ProcessCommand, ProcessResult};

use super::{Executor, Target, Timeouts, launch, run_captured, runtime_command};

/// Runs commands against a remote host's daemon via `docker --host <url>`.
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    docker: Vec<String>,
    host_url: String,
    timeouts: Timeouts,
    target: Target,
}

impl RemoteExecutor {
    pub fn new(
        docker: Vec<String>,
        host: &str,
        scheme: RemoteScheme,
        user: Option<&str>,
        port: Option<u16>,
        timeouts: Timeouts,
    ) -> Result<Self, RunError> {
        validate_host(host)?;
        if let Some(u) = user {
            validate_user(u)?;
        }
        Ok(Self {
            docker,
            host_url: host_url(scheme, host, user, port),
            timeouts,
            target: Target::Remote(host.to_string()),
        })
    }

    pub fn command(&self, args: Vec<String>, attached: bool) -> ProcessCommand {
        let timeout = if attached {
            self.timeouts.attach
        } else {
            self.timeouts.command
        };
        let mut full = Vec::with_capacity(args.len() + 2);
        full.push("--host".to_string());
        full.push(self.host_url.clone());
        full.extend(args);
        runtime_command(&self.docker, full, timeout)
    }
}

impl Executor for RemoteExecutor {
    fn target(&self) -> &Target {
        &self.target
    }

    fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    fn capture(&self, step: Step, args: Vec<String>) -> Result<String, RunError> {
        run_captured(step, self.command(args, false))
    }

    fn relay(
        &self,
        step: Step,
        args: Vec<String>,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<ProcessResult, RunError> {
        launch(step, self.command(args, true), on_line)
    }
}

fn host_url(scheme: RemoteScheme, host: &str, user: Option<&str>, port: Option<u16>) -> String {
    let mut url = format!("{}://", scheme.as_str());
    // tcp endpoints carry no user.
    if let (RemoteScheme::Ssh, Some(u)) = (scheme, user) {
        url.push_str(u);
        url.push('@');
    }
    url.push_str(host);
    if let Some(p) = port {
        url.push(':');
        url.push_str(&p.to_string());
    }
    url
}

/// A host must be a bare DNS name or IP; a leading `-` would reach ssh as an option.
pub(crate) fn validate_host(host: &str) -> Result<(), RunError> {
    let ok = !host.is_empty()
        && !host.starts_with('-')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'));
    if ok {
        Ok(())
    } else {
        Err(RunError::InvalidRequest(format!("invalid target host {host:?}")))
    }
}

pub(crate) fn validate_user(user: &str) -> Result<(), RunError> {
    let ok = !user.is_empty()
        && !user.starts_with('-')
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if ok {
        Ok(())
    } else {
        Err(RunError::InvalidConfig(format!("invalid remote_user {user:?}")))
    }
}
