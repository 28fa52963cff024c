//! # portsweep - A threaded TCP connect port scanner
//!
//! portsweep determines which ports of a single host accept TCP connections,
//! optionally reading a short service banner from each open port.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use portsweep::scanner::{run_scan, ScanConfig};
//! use portsweep::types::PortRange;
//!
//! let range = PortRange::from_bounds(1, 1024).unwrap();
//! let config = ScanConfig::new("192.168.1.1", range).with_threads(200);
//! let report = run_scan(&config).unwrap();
//!
//! for outcome in &report.open {
//!     println!("{}", outcome);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`scanner`] - Job queue, worker pool, shutdown signal, result collector
//!   and the TCP prober that the pool drives
//! - [`banner`] - Banner retrieval over an open connection
//! - [`services`] - Static port to service-label catalog
//! - [`types`] - Port and target types
//! - [`config`] - Settings file and XDG paths
//! - [`logging`] - `tracing` subscriber setup
//! - [`output`] - Plain, JSON and CSV result formatting
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{ScanError, ScanResult};
pub use scanner::{run_scan, ScanConfig, ScanOutcome, ScanReport};
pub use types::{Port, PortRange, ScanTarget};
