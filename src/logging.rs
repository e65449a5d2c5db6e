// src/logging.rs

//! Logging setup for `tapline` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `TAPLINE_LOG`, either a bare level ("debug") or `EnvFilter`
//!    directives ("info,tapline::exec=trace")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout carries only command output
//! (`show_commands`, `dump_ssm_parameters`).

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "TAPLINE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::new(level_from_log_level(lvl).as_str());
    }
    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match parse_level_str(raw) {
            Some(level) => EnvFilter::new(level.as_str()),
            None => EnvFilter::try_new(raw).unwrap_or_else(|_| EnvFilter::new("info")),
        },
        None => EnvFilter::new("info"),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn level_strings_are_case_insensitive() {
        assert_eq!(parse_level_str(" DEBUG "), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("loud"), None);
    }

    #[test]
    fn cli_flag_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Error), Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn env_accepts_levels_and_directives() {
        assert_eq!(
            build_filter(None, Some("Debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            build_filter(None, Some("info,tapline::exec=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(build_filter(None, Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
