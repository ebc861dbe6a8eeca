use tracing::{debug, info, warn};

use crate::error::{RunError, Step};
use crate::exec::Executor;

use super::commands::{create_args, inspect_args, start_args, strip_name_prefix, validate};
use super::types::{RunEvent, RunOutcome, RunRequest};

/// Create a container from `req`, resolve its name, and start it attached.
///
/// All three runtime operations go through `exec`. `observe` sees the
/// identifier, then the name, then every output line. Any failure stops
/// the sequence; a container created before the failure is left in place.
pub fn run_container(
    exec: &dyn Executor,
    req: &RunRequest,
    observe: &mut dyn FnMut(RunEvent),
) -> Result<RunOutcome, RunError> {
    validate(req)?;
    let target = exec.target();

    // ── Create ───────────────────────────────────────────────────────
    let id = exec.capture(Step::Create, create_args(req))?;
    // Some runtimes print pull progress before the id; the id is the last line.
    let id = id.lines().last().unwrap_or_default().trim().to_string();
    if id.is_empty() {
        return Err(RunError::EmptyOutput { step: Step::Create });
    }
    debug!(target: "dockr.run", %target, %id, image = %req.image, "container created");
    observe(RunEvent::Created { id: id.clone() });

    // ── Resolve name ─────────────────────────────────────────────────
    let raw = exec.capture(Step::Inspect, inspect_args(&id))?;
    let name = strip_name_prefix(&raw).to_string();
    if name.is_empty() {
        warn!(target: "dockr.run", %id, "inspect returned an empty name; container left created");
        return Err(RunError::EmptyName { id });
    }
    observe(RunEvent::Named { name: name.clone() });

    // ── Start attached ───────────────────────────────────────────────
    info!(target: "dockr.run", %target, %name, "starting container");
    let result = exec.relay(Step::Start, start_args(&name), &mut |line| {
        observe(RunEvent::Output(line))
    })?;

    if result.timed_out {
        warn!(target: "dockr.run", %name, "attach timed out; client killed, container may still run");
    }
    debug!(target: "dockr.run", %name, exit_code = ?result.exit_code, "container finished");

    Ok(RunOutcome {
        name,
        exit_code: result.exit_code,
        timed_out: result.timed_out,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::exec::Target;
    use crate::process::{OutputLine, ProcessResult};

    /// Records every call and answers from a script.
    struct RecordingExecutor {
        target: Target,
        calls: RefCell<Vec<(Step, Vec<String>)>>,
        create: Result<String, i32>,
        inspect: Result<String, i32>,
        start_lines: Vec<String>,
        start_code: Option<i32>,
    }

    impl RecordingExecutor {
        fn new(target: Target) -> Self {
            Self {
                target,
                calls: RefCell::new(Vec::new()),
                create: Ok("3f2a9c".into()),
                inspect: Ok("/eager_turing".into()),
                start_lines: vec!["5".into()],
                start_code: Some(0),
            }
        }

        fn steps(&self) -> Vec<Step> {
            self.calls.borrow().iter().map(|(s, _)| *s).collect()
        }

        fn args_for(&self, step: Step) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .find(|(s, _)| *s == step)
                .map(|(_, a)| a.clone())
                .unwrap_or_default()
        }
    }

    impl Executor for RecordingExecutor {
        fn target(&self) -> &Target {
            &self.target
        }

        fn capture(&self, step: Step, args: Vec<String>) -> Result<String, RunError> {
            self.calls.borrow_mut().push((step, args));
            let scripted = match step {
                Step::Create => &self.create,
                Step::Inspect => &self.inspect,
                other => panic!("unexpected captured step {other}"),
            };
            scripted.clone().map_err(|code| RunError::Failed {
                step,
                code: Some(code),
                stderr: "Cannot connect to the Docker daemon".into(),
            })
        }

        fn relay(
            &self,
            step: Step,
            args: Vec<String>,
            on_line: &mut dyn FnMut(OutputLine),
        ) -> Result<ProcessResult, RunError> {
            self.calls.borrow_mut().push((step, args));
            for line in &self.start_lines {
                on_line(OutputLine::Stdout(line.clone()));
            }
            Ok(ProcessResult {
                success: self.start_code == Some(0),
                exit_code: self.start_code,
                ..ProcessResult::default()
            })
        }
    }

    fn run(exec: &RecordingExecutor, req: &RunRequest) -> (Result<RunOutcome, RunError>, Vec<RunEvent>) {
        let mut events = Vec::new();
        let result = run_container(exec, req, &mut |ev| events.push(ev));
        (result, events)
    }

    #[test]
    fn issues_create_inspect_start_in_order() {
        let exec = RecordingExecutor::new(Target::Local);
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        assert!(result.is_ok());
        assert_eq!(exec.steps(), vec![Step::Create, Step::Inspect, Step::Start]);
    }

    #[test]
    fn local_end_to_end_with_flags_and_arg() {
        let exec = RecordingExecutor::new(Target::Local);
        let req = RunRequest::new("dockr:1.2.3").with_flags(["--rm"]).with_arg("5");
        let (result, events) = run(&exec, &req);

        let outcome = result.unwrap();
        assert_eq!(outcome.name, "eager_turing");
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(exec.args_for(Step::Create), vec!["create", "--rm", "dockr:1.2.3", "5"]);
        assert_eq!(
            exec.args_for(Step::Inspect),
            vec!["inspect", "--format", "{{.Name}}", "3f2a9c"]
        );
        assert_eq!(exec.args_for(Step::Start), vec!["start", "-a", "eager_turing"]);

        // Name is reported before any container output.
        let named = events
            .iter()
            .position(|e| matches!(e, RunEvent::Named { name } if name == "eager_turing"))
            .expect("name reported");
        let first_output = events
            .iter()
            .position(|e| matches!(e, RunEvent::Output(_)))
            .expect("output relayed");
        assert!(named < first_output);
    }

    #[test]
    fn remote_target_without_flags() {
        let exec = RecordingExecutor::new(Target::Remote("192.168.0.83".into()));
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        assert!(result.is_ok());
        assert_eq!(exec.args_for(Step::Create), vec!["create", "dockr"]);
        assert_eq!(exec.steps().len(), 3);
    }

    #[test]
    fn remote_target_with_flags_and_arg() {
        let exec = RecordingExecutor::new(Target::Remote("192.168.0.83".into()));
        let req = RunRequest::new("dockr:1.2.3").with_flags(["--rm"]).with_arg("5");
        let (result, _) = run(&exec, &req);
        assert_eq!(result.unwrap().name, "eager_turing");
        assert_eq!(exec.args_for(Step::Create), vec!["create", "--rm", "dockr:1.2.3", "5"]);
        assert_eq!(exec.args_for(Step::Start), vec!["start", "-a", "eager_turing"]);
        assert_eq!(exec.steps(), vec![Step::Create, Step::Inspect, Step::Start]);
    }

    #[test]
    fn create_failure_stops_sequence() {
        let mut exec = RecordingExecutor::new(Target::Local);
        exec.create = Err(125);
        let (result, events) = run(&exec, &RunRequest::new("missing:latest"));
        match result {
            Err(RunError::Failed { step, code, .. }) => {
                assert_eq!(step, Step::Create);
                assert_eq!(code, Some(125));
            }
            other => panic!("expected create failure, got {other:?}"),
        }
        assert_eq!(exec.steps(), vec![Step::Create]);
        assert!(events.is_empty());
    }

    #[test]
    fn inspect_failure_skips_start() {
        let mut exec = RecordingExecutor::new(Target::Local);
        exec.inspect = Err(1);
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        assert!(matches!(
            result,
            Err(RunError::Failed {
                step: Step::Inspect,
                ..
            })
        ));
        assert_eq!(exec.steps(), vec![Step::Create, Step::Inspect]);
    }

    #[test]
    fn empty_name_is_fatal() {
        let mut exec = RecordingExecutor::new(Target::Local);
        exec.inspect = Ok("/".into());
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        assert!(matches!(result, Err(RunError::EmptyName { ref id }) if id == "3f2a9c"));
        assert!(!exec.steps().contains(&Step::Start));
    }

    #[test]
    fn empty_identifier_is_fatal() {
        let mut exec = RecordingExecutor::new(Target::Local);
        exec.create = Ok(String::new());
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        assert!(matches!(
            result,
            Err(RunError::EmptyOutput { step: Step::Create })
        ));
        assert_eq!(exec.steps(), vec![Step::Create]);
    }

    #[test]
    fn identifier_is_last_line_of_create_output() {
        let mut exec = RecordingExecutor::new(Target::Local);
        exec.create = Ok("Unable to find image 'dockr:latest' locally\nlatest: Pulling\n9b1e".into());
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        assert!(result.is_ok());
        assert_eq!(exec.args_for(Step::Inspect).last().map(String::as_str), Some("9b1e"));
    }

    #[test]
    fn non_zero_exit_is_an_outcome_not_an_error() {
        let mut exec = RecordingExecutor::new(Target::Local);
        exec.start_code = Some(3);
        let (result, _) = run(&exec, &RunRequest::new("dockr"));
        let outcome = result.unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert!(!outcome.success());
    }

    #[test]
    fn invalid_request_spawns_nothing() {
        let exec = RecordingExecutor::new(Target::Local);
        let (result, _) = run(&exec, &RunRequest::new(""));
        assert!(matches!(result, Err(RunError::InvalidRequest(_))));
        assert!(exec.steps().is_empty());
    }
}
