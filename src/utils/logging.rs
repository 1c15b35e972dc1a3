// src/utils/logging.rs
use crate::utils::config::LoggingConfig;
use crate::utils::error::{AppError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Takes precedence over the configured level when set.
pub const LOG_ENV: &str = "CONTEXT_VAULT_LOG";

pub const LOG_FILE_PREFIX: &str = "context-vault.log";

/// Install the global subscriber. Keep the returned guard alive for as long
/// as file logging should flush.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::Logging(format!("invalid log filter {:?}: {}", level, e)))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
