//! Configuration management for portsweep.
//!
//! Provides XDG-compliant paths and the JSON settings file that supplies
//! scan and logging defaults.

mod settings;

pub use settings::{AppSettings, Paths};
