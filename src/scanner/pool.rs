//! Fixed-size pool of OS worker threads.
//!
//! Each worker repeatedly pulls a port from the shared [`JobQueue`], probes
//! it, records the outcome and acknowledges the port. A worker stops once a
//! dequeue comes back empty while the [`ShutdownSignal`] is raised or the
//! queue has been closed.

use crate::error::{ScanError, ScanResult};
use crate::scanner::collector::ResultCollector;
use crate::scanner::outcome::{ProbeErrorKind, Prober, ScanOutcome};
use crate::scanner::queue::JobQueue;
use crate::scanner::shutdown::ShutdownSignal;
use crate::types::Port;
use indicatif::ProgressBar;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

/// Number of workers to start: never more than there are ports to probe.
pub fn worker_count(configured: usize, ports: usize) -> usize {
    configured.max(1).min(ports)
}

/// Everything a worker needs, handed over at construction.
pub struct WorkerContext<P: ?Sized> {
    pub queue: Arc<JobQueue>,
    pub prober: Arc<P>,
    pub collector: Arc<ResultCollector>,
    pub shutdown: ShutdownSignal,
    pub poll_interval: Duration,
    pub progress: Option<ProgressBar>,
}

impl<P: ?Sized> Clone for WorkerContext<P> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            prober: Arc::clone(&self.prober),
            collector: Arc::clone(&self.collector),
            shutdown: self.shutdown.clone(),
            poll_interval: self.poll_interval,
            progress: self.progress.clone(),
        }
    }
}

/// Handle to a running set of workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    live: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Start `count` named worker threads.
    ///
    /// If the OS refuses a thread, the workers already started are told to
    /// stop and joined before the error is returned.
    pub fn spawn<P>(count: usize, ctx: &WorkerContext<P>) -> ScanResult<Self>
    where
        P: Prober + ?Sized + 'static,
    {
        let live = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(count);

        for id in 0..count {
            let worker_ctx = ctx.clone();
            let guard = LiveGuard::enter(Arc::clone(&live));

            let spawned = thread::Builder::new()
                .name(format!("scan-worker-{}", id))
                .spawn(move || {
                    let _live = guard;
                    run_worker(id, &worker_ctx);
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker = id, error = %e, "failed to spawn scan worker");
                    ctx.shutdown.trigger();
                    ctx.queue.close();
                    Self { handles, live }.join();
                    return Err(ScanError::WorkerSpawn(e));
                }
            }
        }

        Ok(Self { handles, live })
    }

    /// Number of workers started.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Number of workers whose loop has not exited yet.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Wait for every worker thread to exit.
    ///
    /// Callers raise the shutdown signal first; otherwise this blocks for as
    /// long as the workers keep polling. Closing the queue afterwards wakes
    /// idle workers instead of letting their poll interval run out.
    pub fn join(self) {
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("scan-worker").to_string();
            if let Err(payload) = handle.join() {
                error!(
                    worker = %name,
                    panic = panic_message(&*payload),
                    critical = true,
                    "scan worker terminated abnormally"
                );
            }
        }
    }
}

/// The polling loop run by every worker.
fn run_worker<P: Prober + ?Sized>(id: usize, ctx: &WorkerContext<P>) {
    debug!(worker = id, "worker started");

    loop {
        let Some(port) = ctx.queue.dequeue(ctx.poll_interval) else {
            if ctx.shutdown.is_triggered() || ctx.queue.is_closed() {
                break;
            }
            continue;
        };

        let _ack = AckGuard {
            queue: &ctx.queue,
            port,
        };
        let outcome = probe_guarded(&*ctx.prober, port);
        ctx.collector.record(outcome);

        if let Some(progress) = &ctx.progress {
            progress.inc(1);
            progress.set_message(format!("port {}", port));
        }
    }

    debug!(worker = id, "worker stopped");
}

/// Run a probe, converting a panic inside the prober into an outcome.
pub(crate) fn probe_guarded<P: Prober + ?Sized>(prober: &P, port: Port) -> ScanOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| prober.probe(port))).unwrap_or_else(|payload| {
        error!(
            port = port.as_u16(),
            panic = panic_message(&*payload),
            critical = true,
            "unexpected error scanning port"
        );
        ScanOutcome::Errored {
            port,
            kind: ProbeErrorKind::Unexpected,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Acknowledges its port when dropped, including while unwinding.
struct AckGuard<'a> {
    queue: &'a JobQueue,
    port: Port,
}

impl Drop for AckGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.queue.acknowledge(self.port) {
            error!(error = %e, "acknowledgement rejected");
        }
    }
}

/// Counts a worker as live from spawn until its thread exits.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        Self(live)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn port(p: u16) -> Port {
        Port::new(p).unwrap()
    }

    /// Reports every port as open and remembers which thread probed it.
    #[derive(Default)]
    struct RecordingProber {
        threads: Mutex<HashSet<String>>,
    }

    impl Prober for RecordingProber {
        fn probe(&self, port: Port) -> ScanOutcome {
            let name = thread::current().name().unwrap_or_default().to_string();
            self.threads.lock().unwrap().insert(name);
            thread::sleep(Duration::from_millis(5));
            ScanOutcome::open(port, "Unknown Service", None)
        }
    }

    /// Panics on one port, closes the rest.
    struct FaultyProber {
        poisoned: Port,
    }

    impl Prober for FaultyProber {
        fn probe(&self, port: Port) -> ScanOutcome {
            if port == self.poisoned {
                panic!("socket table exhausted");
            }
            ScanOutcome::Closed { port }
        }
    }

    fn context<P: Prober>(prober: P) -> WorkerContext<P> {
        WorkerContext {
            queue: Arc::new(JobQueue::new()),
            prober: Arc::new(prober),
            collector: Arc::new(ResultCollector::new()),
            shutdown: ShutdownSignal::new(),
            poll_interval: Duration::from_millis(20),
            progress: None,
        }
    }

    #[test]
    fn test_worker_count_clamps_to_ports() {
        assert_eq!(worker_count(100, 10), 10);
        assert_eq!(worker_count(100, 1000), 100);
        assert_eq!(worker_count(0, 10), 1);
        assert_eq!(worker_count(4, 4), 4);
    }

    #[test]
    fn test_pool_processes_every_port() {
        let ctx = context(RecordingProber::default());
        let pool = WorkerPool::spawn(4, &ctx).unwrap();
        assert_eq!(pool.size(), 4);

        for p in 1..=40 {
            ctx.queue.enqueue(port(p));
        }
        ctx.queue.join();
        ctx.shutdown.trigger();
        pool.join();

        assert_eq!(ctx.collector.summary().open, 40);
        let threads = ctx.prober.threads.lock().unwrap();
        assert!(threads.len() <= 4);
        assert!(threads.iter().all(|t| t.starts_with("scan-worker-")));
    }

    #[test]
    fn test_workers_exit_after_shutdown() {
        let ctx = context(RecordingProber::default());
        let pool = WorkerPool::spawn(3, &ctx).unwrap();
        assert_eq!(pool.live_workers(), 3);

        ctx.shutdown.trigger();
        let live = Arc::clone(&pool.live);
        pool.join();
        assert_eq!(live.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_close_releases_idle_workers_early() {
        let mut ctx = context(RecordingProber::default());
        ctx.poll_interval = Duration::from_secs(30);
        let pool = WorkerPool::spawn(4, &ctx).unwrap();
        thread::sleep(Duration::from_millis(20));

        let start = std::time::Instant::now();
        ctx.shutdown.trigger();
        ctx.queue.close();
        pool.join();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_prober_panic_is_contained() {
        let ctx = context(FaultyProber { poisoned: port(7) });
        let pool = WorkerPool::spawn(2, &ctx).unwrap();

        for p in 1..=10 {
            ctx.queue.enqueue(port(p));
        }
        ctx.queue.join();
        assert_eq!(pool.live_workers(), 2);

        ctx.shutdown.trigger();
        pool.join();

        let tally = ctx.collector.summary();
        assert_eq!(tally.closed, 9);
        assert_eq!(tally.unexpected, 1);
        assert_eq!(ctx.queue.pending(), 0);
    }

    #[test]
    fn test_ack_guard_fires_on_unwind() {
        let queue = JobQueue::new();
        queue.enqueue(port(9));
        let p = queue.dequeue(Duration::ZERO).unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ack = AckGuard { queue: &queue, port: p };
            panic!("worker fault");
        }));

        assert!(result.is_err());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(&*payload), "owned boom");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*payload), "non-string panic payload");
    }
}
