use crate::process::OutputLine;

/// What to run: an image plus the optional inputs that shape `create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    /// Extra `create` flags, passed in order as separate arguments.
    pub flags: Vec<String>,
    /// Single argument appended after the image.
    pub workload_arg: Option<String>,
}

impl RunRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.workload_arg = Some(arg.into());
        self
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub name: String,
    /// `None` when the attached client was killed or ended by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Progress reported while a run is underway.
#[derive(Debug)]
pub enum RunEvent {
    Created { id: String },
    /// Emitted before the container produces any output.
    Named { name: String },
    Output(OutputLine),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_inputs() {
        let req = RunRequest::new("dockr:1.2.3")
            .with_flags(["--rm", "-e", "N=5"])
            .with_arg("5");
        assert_eq!(req.image, "dockr:1.2.3");
        assert_eq!(req.flags, vec!["--rm", "-e", "N=5"]);
        assert_eq!(req.workload_arg.as_deref(), Some("5"));
    }

    #[test]
    fn outcome_success_requires_zero_exit() {
        let mut outcome = RunOutcome {
            name: "eager_turing".into(),
            exit_code: Some(0),
            timed_out: false,
        };
        assert!(outcome.success());
        outcome.exit_code = Some(2);
        assert!(!outcome.success());
        outcome.exit_code = None;
        assert!(!outcome.success());
    }
}
