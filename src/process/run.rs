use std::io::{self, BufRead};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::types::{OutputLine, ProcessCommand, ProcessResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spawn a process and return a channel that streams its output.
///
/// The caller receives [`OutputLine::Stdout`]/[`OutputLine::Stderr`] as they
/// arrive, followed by exactly one [`OutputLine::Done`] carrying the final
/// result.
pub fn spawn(cmd: ProcessCommand) -> io::Result<Receiver<OutputLine>> {
    trace!(target: "dockr.process", command = %cmd.display(), "spawn");

    let mut child = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(io::Error::other("child output pipes were not captured"));
    };

    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        supervise(child, stdout, stderr, tx, cmd.timeout);
    });

    Ok(rx)
}

/// Run to completion, forwarding every output line to `on_line`.
pub fn relay(
    cmd: ProcessCommand,
    on_line: &mut dyn FnMut(OutputLine),
) -> io::Result<ProcessResult> {
    let rx = spawn(cmd)?;
    for line in rx {
        match line {
            OutputLine::Done(result) => return Ok(result),
            other => on_line(other),
        }
    }
    Err(io::Error::other("process supervisor exited without a result"))
}

/// Run to completion, keeping output only in the returned result.
pub fn capture(cmd: ProcessCommand) -> io::Result<ProcessResult> {
    relay(cmd, &mut |_| {})
}

fn supervise(
    mut child: std::process::Child,
    stdout: std::process::ChildStdout,
    stderr: std::process::ChildStderr,
    tx: Sender<OutputLine>,
    timeout: Option<Duration>,
) {
    let out_buf = Arc::new(Mutex::new(String::new()));
    let err_buf = Arc::new(Mutex::new(String::new()));

    // --- reader threads ---------------------------------------------------
    let stdout_handle = forward(stdout, tx.clone(), out_buf.clone(), OutputLine::Stdout);
    let stderr_handle = forward(stderr, tx.clone(), err_buf.clone(), OutputLine::Stderr);

    // --- poll loop ---------------------------------------------------------
    let start = Instant::now();
    let mut timed_out = false;

    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(_) => break None,
        }

        if timeout.is_some_and(|t| start.elapsed() > t) {
            debug!(target: "dockr.process", pid = child.id(), "timeout reached; killing child");
            timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    // --- finalize ----------------------------------------------------------
    // After a timeout a grandchild may still hold the pipes open; leave the
    // readers detached rather than wait on it.
    if !timed_out {
        let _ = stdout_handle.join();
        let _ = stderr_handle.join();
    }

    let exit_code = exit_status.and_then(|s| s.code());
    let take = |buf: &Arc<Mutex<String>>| buf.lock().map(|b| b.clone()).unwrap_or_default();

    // Receiver may be dropped; ignore send errors.
    let _ = tx.send(OutputLine::Done(ProcessResult {
        success: exit_code == Some(0),
        exit_code,
        stdout: take(&out_buf),
        stderr: take(&err_buf),
        timed_out,
    }));
}

fn forward<R>(
    reader: R,
    tx: Sender<OutputLine>,
    buf: Arc<Mutex<String>>,
    wrap: fn(String) -> OutputLine,
) -> std::thread::JoinHandle<()>
where
    R: io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let reader = io::BufReader::new(reader);
        for line in reader.lines() {
            let Ok(l) = line else { break };
            if let Ok(mut b) = buf.lock() {
                b.push_str(&l);
                b.push('\n');
            }
            let _ = tx.send(wrap(l));
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessCommand {
        ProcessCommand::new("sh").args(["-c", script])
    }

    #[test]
    fn capture_collects_both_streams() {
        let result = capture(sh("echo out; echo err >&2")).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert!(!result.timed_out);
    }

    #[test]
    fn relay_forwards_lines_in_order() {
        let mut seen = Vec::new();
        let result = relay(sh("echo 1; echo 2; echo 3"), &mut |line| {
            if let OutputLine::Stdout(s) = line {
                seen.push(s);
            }
        })
        .unwrap();
        assert!(result.success);
        assert_eq!(seen, vec!["1", "2", "3"]);
    }

    #[test]
    fn non_zero_exit_is_reported() {
        let result = capture(sh("exit 7")).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(7));
    }

    #[test]
    fn timeout_kills_child() {
        let cmd = sh("exec sleep 5").timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let result = capture(cmd).unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
        assert_eq!(result.exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn timeout_does_not_wait_for_grandchild_holding_pipes() {
        // `sh` stays the parent here, so the `sleep` it forks keeps stdout open
        // after `sh` itself is killed.
        let cmd = sh("sleep 3; true").timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let result = capture(cmd).unwrap();
        assert!(result.timed_out);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = capture(ProcessCommand::new("definitely-not-a-real-binary-dockr")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
