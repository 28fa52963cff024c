//! Result collection shared by the worker pool.
//!
//! Workers record every outcome they produce. Open outcomes are kept for the
//! caller; the rest only feed the summary counters.

use crate::scanner::outcome::{ProbeErrorKind, ScanOutcome};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Per-status totals for a finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTally {
    pub open: usize,
    pub closed: usize,
    pub timed_out: usize,
    pub socket_errors: usize,
    pub unexpected: usize,
}

impl ScanTally {
    /// Total number of outcomes counted.
    pub fn total(&self) -> usize {
        self.open + self.closed + self.timed_out + self.socket_errors + self.unexpected
    }
}

/// Thread-safe, append-only sink for scan outcomes.
#[derive(Debug, Default)]
pub struct ResultCollector {
    open: Mutex<Vec<ScanOutcome>>,
    closed: AtomicUsize,
    timed_out: AtomicUsize,
    socket_errors: AtomicUsize,
    unexpected: AtomicUsize,
}

impl ResultCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome. Safe to call from any number of workers.
    pub fn record(&self, outcome: ScanOutcome) {
        let counter = match &outcome {
            ScanOutcome::Open { .. } => None,
            ScanOutcome::Closed { .. } => Some(&self.closed),
            ScanOutcome::Errored { kind, .. } => Some(match kind {
                ProbeErrorKind::Timeout => &self.timed_out,
                ProbeErrorKind::SocketError => &self.socket_errors,
                ProbeErrorKind::Unexpected => &self.unexpected,
            }),
        };

        match counter {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            None => self
                .open
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(outcome),
        }
    }

    /// Current totals.
    pub fn summary(&self) -> ScanTally {
        ScanTally {
            open: self.open.lock().unwrap_or_else(PoisonError::into_inner).len(),
            closed: self.closed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            socket_errors: self.socket_errors.load(Ordering::Relaxed),
            unexpected: self.unexpected.load(Ordering::Relaxed),
        }
    }

    /// Copy of the open outcomes recorded so far.
    pub fn snapshot(&self) -> Vec<ScanOutcome> {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consume the collector and return the open outcomes, in record order.
    pub fn drain(self) -> Vec<ScanOutcome> {
        self.open.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
