use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const ENV_VAR: &str = "DOCKR_LOG";
pub const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),
}

/// Pick the filter directive: explicit flag, then `DOCKR_LOG`, then config, then `warn`.
pub fn resolve_level(flag: Option<&str>, env: Option<&str>, config: Option<&str>) -> String {
    [flag, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LEVEL)
        .to_string()
}

/// Install a text subscriber on stderr; stdout is reserved for container output.
pub fn init(level: &str) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))?;
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggerError::InitializationFailed(e.to_string()))
}
