//! Job queue with a completion barrier.
//!
//! A FIFO of pending ports shared by the worker pool. Every dequeued port
//! must be acknowledged exactly once; [`JobQueue::join`] blocks until the
//! number of unacknowledged ports drops to zero.

use crate::error::QueueError;
use crate::types::Port;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<Port>,
    /// Enqueued but not yet acknowledged.
    pending: usize,
    /// Set once no consumer should block anymore.
    closed: bool,
}

/// Thread-safe FIFO of ports with timed retrieval and a join barrier.
#[derive(Debug, Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    drained: Condvar,
}

impl JobQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the state consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a port and wake one waiting consumer.
    pub fn enqueue(&self, port: Port) {
        let mut state = self.lock();
        state.items.push_back(port);
        state.pending += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Take the oldest port, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` when the wait expires, letting the caller re-check its
    /// shutdown signal instead of blocking forever. A closed queue still hands
    /// out its remaining ports but returns `None` at once when empty.
    pub fn dequeue(&self, timeout: Duration) -> Option<Port> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(port) = state.items.pop_front() {
                return Some(port);
            }
            if state.closed {
                return None;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            state = self
                .available
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Wake every blocked consumer and stop future dequeues from waiting.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Mark a previously dequeued port as processed.
    pub fn acknowledge(&self, port: Port) -> Result<(), QueueError> {
        let mut state = self.lock();
        if state.pending == 0 {
            return Err(QueueError::Unbalanced(port.as_u16()));
        }
        state.pending -= 1;
        let done = state.pending == 0;
        drop(state);

        if done {
            self.drained.notify_all();
        }
        Ok(())
    }

    /// Block until every enqueued port has been acknowledged.
    pub fn join(&self) {
        let mut state = self.lock();
        while state.pending > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`join`](Self::join), but gives up after `timeout`.
    ///
    /// Returns `true` if the barrier was reached.
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .drained
            .wait_timeout_while(state, timeout, |s| s.pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
        state.pending == 0
    }

    /// Ports enqueued but not yet acknowledged.
    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    /// Ports waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether no ports are waiting to be dequeued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
