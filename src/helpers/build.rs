use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{RunError, Step};
use crate::exec::{Executor, check};
use crate::process::OutputLine;

/// Inputs for `docker build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub dockerfile: PathBuf,
    pub tag: String,
    pub context: PathBuf,
}

/// `build -f <dockerfile> -t <tag> <context>`
pub fn build_args(req: &BuildRequest) -> Vec<String> {
    vec![
        "build".into(),
        "-f".into(),
        req.dockerfile.display().to_string(),
        "-t".into(),
        req.tag.clone(),
        req.context.display().to_string(),
    ]
}

/// Build an image on the executor's target, relaying build output.
///
/// The Dockerfile and context are read locally by the client, also when the
/// daemon is remote.
pub fn build_image(
    exec: &dyn Executor,
    req: &BuildRequest,
    on_line: &mut dyn FnMut(OutputLine),
) -> Result<(), RunError> {
    let tag = req.tag.trim();
    if tag.is_empty() || tag.starts_with('-') || tag.chars().any(char::is_whitespace) {
        return Err(RunError::InvalidRequest(format!("invalid image tag {:?}", req.tag)));
    }
    for path in [&req.dockerfile, &req.context] {
        if option_like(path) {
            return Err(RunError::InvalidRequest(format!(
                "path {} would be read as an option; prefix it with ./",
                path.display()
            )));
        }
    }
    if !req.dockerfile.is_file() {
        return Err(RunError::MissingPath {
            step: Step::Build,
            path: req.dockerfile.clone(),
        });
    }
    if !req.context.is_dir() {
        return Err(RunError::MissingPath {
            step: Step::Build,
            path: req.context.clone(),
        });
    }

    info!(target: "dockr.helpers", host = %exec.target(), tag, "building image");
    let result = exec.relay(Step::Build, build_args(req), on_line)?;
    check(Step::Build, &result, exec.timeouts().attach)
}

fn option_like(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().starts_with('-')
}
