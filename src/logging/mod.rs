//! Structured logging initialization
//!
//! Console logging is always on; an optional JSON file layer writes
//! rotated log files for run archaeology. The returned guard must stay
//! alive for the duration of the process so buffered file output is
//! flushed on shutdown.

use crate::config::LoggingConfig;
use crate::domain::{RegsimError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Keeps the file-logging worker alive
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the global tracing subscriber
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("regsim={level},warn")));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .compact();

    let (file_layer, file_guard) = if config.local_enabled {
        let appender = match config.local_rotation.to_lowercase().as_str() {
            "hourly" => rolling::hourly(&config.local_path, "regsim.log"),
            "never" => rolling::never(&config.local_path, "regsim.log"),
            _ => rolling::daily(&config.local_path, "regsim.log"),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn parse_log_level(level: &str) -> Result<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(RegsimError::Configuration(format!(
            "Invalid log level: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_accepts_known_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "INFO"] {
            assert!(parse_log_level(level).is_ok());
        }
    }

    #[test]
    fn test_parse_log_level_rejects_unknown() {
        assert!(parse_log_level("verbose").is_err());
    }
}
