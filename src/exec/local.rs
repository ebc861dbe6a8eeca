use crate::error::{RunError, Step};
use crate::process::{OutputLine, ProcessCommand, ProcessResult};

use super::{Executor, Target, Timeouts, launch, run_captured, runtime_command};

/// Runs commands against the daemon the local client is configured for.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    docker: Vec<String>,
    timeouts: Timeouts,
    target: Target,
}

impl LocalExecutor {
    pub fn new(docker: Vec<String>, timeouts: Timeouts) -> Self {
        Self {
            docker,
            timeouts,
            target: Target::Local,
        }
    }

    pub fn command(&self, args: Vec<String>, attached: bool) -> ProcessCommand {
        let timeout = if attached {
            self.timeouts.attach
        } else {
            self.timeouts.command
        };
        runtime_command(&self.docker, args, timeout)
    }
}

impl Executor for LocalExecutor {
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
