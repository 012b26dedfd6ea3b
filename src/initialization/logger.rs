//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::io::Write;

use crate::config::{LogFormat, WidgetSettings};
use crate::error_handling::InitializationError;
use colored::*;
use log::{Level, LevelFilter};

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (target and colored level) and JSON lines for structured logging.
///
/// `RUST_LOG` is read first; `level` then overrides the global level and the
/// level of this crate's own targets.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already set.
///
/// # Examples
///
/// ```bash
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=ip_finder=debug,reqwest=info widget-host
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("ip_finder", level);

    match format {
        LogFormat::Json => builder.format(|buf, record| {
            writeln!(
                buf,
                "{}",
                json_line(
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    &record.args().to_string(),
                )
            )
        }),
        LogFormat::Plain => builder.format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                record.target().cyan(),
                colored_level(record.level()),
                record.args()
            )
        }),
    };

    // try_init: tests may initialize more than once
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// One JSON object per line, the message escaped as a JSON string.
fn json_line(ts_millis: i64, level: Level, target: &str, message: &str) -> String {
    format!(
        "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
        ts_millis,
        level,
        target,
        serde_json::to_string(message).unwrap_or_else(|_| "\"\"".into())
    )
}

fn colored_level(level: Level) -> ColoredString {
    let label = level.to_string();
    match level {
        Level::Error => label.red(),
        Level::Warn => label.yellow(),
        Level::Info => label.green(),
        Level::Debug => label.blue(),
        Level::Trace => label.purple(),
    }
}

/// Initializes the logger from the `log-level` and `log-format` settings.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already set.
pub fn init_logger_from_settings(settings: &WidgetSettings) -> Result<(), InitializationError> {
    init_logger_with(settings.log_level.clone().into(), settings.log_format.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_second_init_reports_logger_error() {
        // env_logger can only be installed once per process; whichever of the
        // two calls comes second must fail without panicking
        let _ = env_logger::builder().is_test(true).try_init();
        let result = init_logger_with(LevelFilter::Info, LogFormat::Json);
        assert!(matches!(result, Err(InitializationError::LoggerError(_))));
    }

    #[test]
    fn test_init_from_settings_fails_once_a_logger_is_installed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let settings = WidgetSettings {
            log_level: LogLevel::Debug,
            log_format: LogFormat::Plain,
            ..WidgetSettings::default()
        };
        assert!(matches!(
            init_logger_from_settings(&settings),
            Err(InitializationError::LoggerError(_))
        ));
    }

    #[test]
    fn test_log_level_setting_maps_to_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::Debug);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::Error);
    }

    #[test]
    fn test_json_line_escapes_message() {
        let line = json_line(1_700_000_000_000, Level::Warn, "ip_finder::tile", "say \"hi\"\n");
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["ts"], 1_700_000_000_000_i64);
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["target"], "ip_finder::tile");
        assert_eq!(value["msg"], "say \"hi\"\n");
    }
}
