//! Tracing subscriber setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{
    config::LoggingConfig,
    error::{AppError, AppResult},
};

const LOG_FILE_PREFIX: &str = "lending-kiosk.log";

/// Install the global subscriber described by `config`.
///
/// Logs go to stderr unless a directory is configured, in which case they go
/// to a daily rolling file. Keep the returned guard alive until exit so
/// buffered file output is flushed.
pub fn init(config: &LoggingConfig) -> AppResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lending_kiosk={}", config.level).into());
    let registry = tracing_subscriber::registry().with(filter);

    let (writer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = config.directory.is_none();

    let result = match config.format.as_str() {
        "journald" => registry.with(tracing_journald::layer()?).try_init(),
        "json" => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        _ => registry
            .with(fmt::layer().with_ansi(ansi).with_writer(writer))
            .try_init(),
    };
    result.map_err(|e| AppError::Internal(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
