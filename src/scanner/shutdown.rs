//! Cooperative shutdown signal.
//!
//! A one-way flag owned by the scan coordinator and cloned into every
//! worker. Workers poll it between queue waits; nothing is interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. Transitions once from running to stopped and is never
/// reset.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a signal in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` only for the call that raised it.
    pub fn trigger(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    /// Whether the signal has been raised.
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_running() {
        assert!(!ShutdownSignal::new().is_triggered());
    }

    #[test]
    fn test_trigger_is_monotonic() {
        let signal = ShutdownSignal::new();
        assert!(signal.trigger());
        assert!(signal.is_triggered());
        assert!(!signal.trigger());
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_clones_observe_trigger() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        let handle = thread::spawn(move || {
            while !observer.is_triggered() {
                thread::yield_now();
            }
        });
        signal.trigger();
        handle.join().unwrap();
    }
}
