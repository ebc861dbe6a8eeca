use std::time::Duration;

use serde::Deserialize;

/// How the remote executor reaches a target's Docker daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteScheme {
    Ssh,
    Tcp,
}

impl RemoteScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteScheme::Ssh => "ssh",
            RemoteScheme::Tcp => "tcp",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runtime command line, split with shell-words (e.g. `"docker"` or `"sudo docker"`).
    pub docker: String,
    pub remote_scheme: RemoteScheme,
    pub remote_user: Option<String>,
    /// Port for the remote daemon endpoint; with the ssh scheme it is also
    /// handed to `copy_program` as `-P <port>` (scp syntax).
    pub remote_port: Option<u16>,
    /// Copy command line used by `copy`; sources and destination are appended.
    pub copy_program: String,
    /// Seconds allowed for captured commands (create, inspect). `0` disables.
    pub command_timeout: u64,
    /// Seconds allowed for streamed commands (start, build, copy). `0` disables.
    pub attach_timeout: u64,
    pub target: Option<String>,
    /// Default runtime flags for `run`, split with shell-words.
    pub flags: Option<String>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            remote_scheme: RemoteScheme::Ssh,
            remote_user: None,
            remote_port: None,
            copy_program: "scp -r".to_string(),
            command_timeout: 300,
            attach_timeout: 0,
            target: None,
            flags: None,
            log_level: None,
        }
    }
}

impl Config {
    /// The runtime command as program plus leading arguments.
    pub fn docker_command(&self) -> Result<Vec<String>, String> {
        split_command("docker", &self.docker)
    }

    pub fn copy_command(&self) -> Result<Vec<String>, String> {
        split_command("copy_program", &self.copy_program)
    }

    /// Default runtime flags, tokenized. Empty when unset.
    pub fn default_flags(&self) -> Result<Vec<String>, String> {
        match &self.flags {
            Some(raw) => split_flags(raw),
            None => Ok(Vec::new()),
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        secs(self.command_timeout)
    }

    pub fn attach_timeout(&self) -> Option<Duration> {
        secs(self.attach_timeout)
    }
}

/// Tokenize a runtime flag string the way a POSIX shell would, without running one.
pub fn split_flags(raw: &str) -> Result<Vec<String>, String> {
    shell_words::split(raw).map_err(|e| format!("cannot parse flags {raw:?}: {e}"))
}

fn split_command(field: &str, raw: &str) -> Result<Vec<String>, String> {
    let words = shell_words::split(raw).map_err(|e| format!("{field}: {e}"))?;
    if words.is_empty() {
        return Err(format!("{field} must name a program"));
    }
    Ok(words)
}

fn secs(n: u64) -> Option<Duration> {
    (n > 0).then(|| Duration::from_secs(n))
}
