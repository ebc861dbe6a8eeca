use crate::error::RunError;

use super::types::RunRequest;

/// Go template that makes `inspect` print only the container name.
pub const NAME_TEMPLATE: &str = "{{.Name}}";

/// Reject requests the runtime would misread before anything is spawned.
pub fn validate(req: &RunRequest) -> Result<(), RunError> {
    let image = req.image.trim();
    if image.is_empty() {
        return Err(RunError::InvalidRequest("image name is empty".into()));
    }
    if image.starts_with('-') {
        return Err(RunError::InvalidRequest(format!(
            "image name {:?} looks like a flag",
            req.image
        )));
    }
    if image.chars().any(char::is_whitespace) {
        return Err(RunError::InvalidRequest(format!(
            "image name {:?} contains whitespace",
            req.image
        )));
    }
    if let Some(i) = req.flags.iter().position(|f| f.is_empty()) {
        return Err(RunError::InvalidRequest(format!("runtime flag #{i} is empty")));
    }
    Ok(())
}

/// `create [flags...] <image> [arg]`
pub fn create_args(req: &RunRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(req.flags.len() + 3);
    args.push("create".to_string());
    args.extend(req.flags.iter().cloned());
    args.push(req.image.trim().to_string());
    if let Some(arg) = &req.workload_arg {
        args.push(arg.clone());
    }
    args
}

/// `inspect --format {{.Name}} <id>`
pub fn inspect_args(id: &str) -> Vec<String> {
    vec![
        "inspect".into(),
        "--format".into(),
        NAME_TEMPLATE.into(),
        id.into(),
    ]
}

/// `start -a <name>`
pub fn start_args(name: &str) -> Vec<String> {
    vec!["start".into(), "-a".into(), name.into()]
}

/// Docker reports names as `/name`; drop exactly one leading `/`.
pub fn strip_name_prefix(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix('/').unwrap_or(raw)
}
