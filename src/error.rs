//! Error types for portsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-port probe failures
//! are not errors at this level: they are folded into
//! [`ScanOutcome`](crate::scanner::ScanOutcome) values and never abort a scan.

use std::path::PathBuf;
use thiserror::Error;

/// Coordinator-level failures. These are the only errors that end a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid port range: {0}")]
    InvalidRange(#[from] crate::types::PortError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn scan worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Misuse of the job queue's acknowledgement protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("port {0} acknowledged with no pending work")]
    Unbalanced(u16),
}

/// Configuration loading and saving errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
