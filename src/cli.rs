//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Options left
//! unset fall back to the settings file, then to built-in defaults.

use crate::config::AppSettings;
use crate::error::ScanResult;
use crate::scanner::ScanConfig;
use crate::types::PortRange;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// A threaded TCP connect port scanner.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A threaded TCP connect port scanner", long_about = None)]
pub struct Args {
    /// Target IP address or hostname to scan
    #[arg(value_name = "HOST")]
    pub host: String,

    /// First port of the range (inclusive)
    #[arg(value_name = "START_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub start_port: u16,

    /// Last port of the range (inclusive)
    #[arg(value_name = "END_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub end_port: u16,

    /// Maximum number of worker threads [default: 100]
    #[arg(short = 'T', long, env = "PORTSWEEP_THREADS")]
    pub threads: Option<usize>,

    /// Connection timeout in milliseconds [default: 1000]
    #[arg(short = 't', long = "timeout", value_name = "MS")]
    pub timeout: Option<u64>,

    /// Banner read timeout in milliseconds [default: 500]
    #[arg(long, value_name = "MS")]
    pub banner_timeout: Option<u64>,

    /// Skip banner grabbing on open ports
    #[arg(long)]
    pub no_banner: bool,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Show a progress bar while scanning
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress console logging and non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a custom settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, conflicts_with = "log_dir")]
    pub no_log_file: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", env = "PORTSWEEP_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    /// The requested port range.
    pub fn port_range(&self) -> ScanResult<PortRange> {
        Ok(PortRange::from_bounds(self.start_port, self.end_port)?)
    }

    /// Merge command-line options over the loaded settings.
    pub fn scan_config(&self, settings: &AppSettings) -> ScanResult<ScanConfig> {
        let connect = self
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.connect_timeout());
        let banner = self
            .banner_timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.banner_timeout());

        let config = ScanConfig::new(self.host.as_str(), self.port_range()?)
            .with_threads(self.threads.unwrap_or(settings.threads))
            .with_timeouts(connect, banner)
            .with_banners(settings.grab_banners && !self.no_banner)
            .with_poll_interval(settings.poll_interval());

        let config = if self.verbose {
            config.with_progress()
        } else {
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Effective log level.
    pub fn log_level<'a>(&'a self, settings: &'a AppSettings) -> &'a str {
        self.log_level.as_deref().unwrap_or(&settings.log_level)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
