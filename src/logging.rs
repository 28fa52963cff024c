//! Logging setup.
//!
//! Installs a `tracing` subscriber that writes human-readable records to
//! stderr and, when a log directory is configured, plain-text records to
//! `portsweep.log` through a non-blocking file appender. `RUST_LOG`
//! overrides the configured level.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "portsweep.log";

/// Initialize the logging system.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the lifetime of the program.
pub fn init_logging(level: &str, log_dir: Option<&Path>, console: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = create_env_filter(level)?;

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(true)
    });

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let (writer, guard) = non_blocking(rolling::never(dir, LOG_FILE_NAME));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::debug!(level, "logging initialized");
    Ok(guard)
}

/// Parse a level name. Accepts `warning` and `critical` as aliases.
pub fn parse_level(level: &str) -> Result<Level> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => bail!("Invalid log level: {}", level),
    })
}

/// Create the environment filter from a log level string.
fn create_env_filter(level: &str) -> Result<EnvFilter> {
    let base_level = parse_level(level)?;

    EnvFilter::builder()
        .with_default_directive(base_level.into())
        .from_env()
        .context("Failed to create environment filter")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_level("warning").unwrap(), Level::WARN);
        assert_eq!(parse_level("critical").unwrap(), Level::ERROR);
        assert!(parse_level("loud").is_err());
    }
}
