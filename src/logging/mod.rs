//! Service Logging
//!
//! Initializes the process-wide `tracing` subscriber for an HA service:
//! - console output (optional)
//! - `<log_path>/<service>.log` with size-based rotation, written from a
//!   background worker
//! - syslog over UDP when a server and port are configured
//!
//! Each layer carries its own filter. `RUST_LOG` overrides the configured
//! level when set.

mod rotation;
mod syslog;

pub use rotation::RotatingFile;
pub use syslog::SyslogMakeWriter;

use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

// =============================================================================
// Options
// =============================================================================

/// Fully resolved logging options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Service name, used for the log file name and syslog tag
    pub service_name: String,
    /// Directory the log file is written to
    pub log_path: PathBuf,
    pub level: Level,
    /// Rotated files kept next to the active one
    pub backup_count: usize,
    /// Size at which the active file rotates
    pub file_size_mb: u64,
    pub syslog_server: Option<String>,
    pub syslog_port: Option<u16>,
    /// Mirror log output to the console
    pub console_output: bool,
}

impl LogOptions {
    /// Path of the active log file
    pub fn log_file(&self) -> PathBuf {
        self.log_path.join(format!("{}.log", self.service_name))
    }

    fn max_file_bytes(&self) -> u64 {
        self.file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Parse a configured level name
///
/// Accepts the tracing names plus `WARNING` and `CRITICAL`, case-insensitively.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        other => Err(Error::Configuration(format!("Unknown log level: {}", other))),
    }
}

// =============================================================================
// Guard
// =============================================================================

/// Keeps the background file writer alive
///
/// Dropping the guard flushes buffered output.
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

// =============================================================================
// Initialization
// =============================================================================

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()))
}

/// Install the global subscriber described by `options`
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(options: &LogOptions) -> Result<LoggingGuard> {
    std::fs::create_dir_all(&options.log_path)?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if options.console_output {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_filter(level_filter(options.level));
        layers.push(Box::new(console_layer));
    }

    let file = RotatingFile::open(
        options.log_file(),
        options.max_file_bytes(),
        options.backup_count,
    )?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .with_filter(level_filter(options.level));
    layers.push(Box::new(file_layer));

    if let (Some(server), Some(port)) = (&options.syslog_server, options.syslog_port) {
        let sink = SyslogMakeWriter::connect(server, port, options.service_name.clone())?;
        let syslog_layer = fmt::layer()
            .with_writer(sink)
            .with_ansi(false)
            .with_level(false)
            .without_time()
            .with_filter(level_filter(options.level));
        layers.push(Box::new(syslog_layer));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    info!(
        log_file = %options.log_file().display(),
        level = %options.level,
        "Started logging for service {}",
        options.service_name
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("WARNING").unwrap(), Level::WARN);
        assert_eq!(parse_level("CRITICAL").unwrap(), Level::ERROR);
        assert_matches!(parse_level("LOUD"), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_log_file_and_size() {
        let options = LogOptions {
            service_name: "cluster_manager".into(),
            log_path: PathBuf::from("/var/log/ha"),
            level: Level::INFO,
            backup_count: 5,
            file_size_mb: 10,
            syslog_server: None,
            syslog_port: None,
            console_output: true,
        };
        assert_eq!(options.log_file(), PathBuf::from("/var/log/ha/cluster_manager.log"));
        assert_eq!(options.max_file_bytes(), 10 * 1024 * 1024);
    }
}
