//! Scanner module - coordinates a complete scan of one host.
//!
//! The coordinator sizes and starts the worker pool, feeds every port of the
//! range into the job queue, waits on the queue's join barrier, raises the
//! shutdown signal and finally hands the collected open ports back to the
//! caller.

pub mod collector;
pub mod outcome;
pub mod pool;
pub mod prober;
pub mod queue;
pub mod shutdown;

use crate::error::{ScanError, ScanResult};
use crate::types::{Port, PortRange};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub use collector::{ResultCollector, ScanTally};
pub use outcome::{ProbeErrorKind, Prober, ScanOutcome};
pub use pool::{worker_count, WorkerContext, WorkerPool};
pub use prober::TcpProber;
pub use queue::JobQueue;
pub use shutdown::ShutdownSignal;

/// Configuration for a scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Hostname or literal IP, passed through untouched.
    pub host: String,
    /// Inclusive range of ports to probe.
    pub range: PortRange,
    /// Upper bound on worker threads.
    pub threads: usize,
    /// Bound on each connection attempt.
    pub connect_timeout: Duration,
    /// Bound on each banner read or write.
    pub banner_timeout: Duration,
    /// Whether to attempt banner grabbing on open ports.
    pub grab_banners: bool,
    /// How long an idle worker waits on the queue before re-checking shutdown.
    pub poll_interval: Duration,
    /// Show a progress bar while scanning.
    pub progress: bool,
}

impl ScanConfig {
    /// Default upper bound on worker threads.
    pub const DEFAULT_THREADS: usize = 100;

    /// Create a new scan configuration with default tuning.
    pub fn new(host: impl Into<String>, range: PortRange) -> Self {
        Self {
            host: host.into(),
            range,
            threads: Self::DEFAULT_THREADS,
            connect_timeout: Duration::from_millis(1000),
            banner_timeout: Duration::from_millis(500),
            grab_banners: true,
            poll_interval: Duration::from_secs(1),
            progress: false,
        }
    }

    /// Set the worker thread limit.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the connect and banner timeouts.
    pub fn with_timeouts(mut self, connect: Duration, banner: Duration) -> Self {
        self.connect_timeout = connect;
        self.banner_timeout = banner;
        self
    }

    /// Enable or disable banner grabbing.
    pub fn with_banners(mut self, grab_banners: bool) -> Self {
        self.grab_banners = grab_banners;
        self
    }

    /// Set the idle poll interval of the workers.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Show a progress bar while scanning.
    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }

    /// Reject settings the worker pool cannot run with.
    pub fn validate(&self) -> ScanResult<()> {
        if self.threads == 0 {
            return Err(ScanError::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        if self.grab_banners && self.banner_timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "banner timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ScanError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete scan results.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub host: String,
    pub start_port: Port,
    pub end_port: Port,
    pub ports_scanned: usize,
    /// Worker threads actually started.
    pub workers: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub tally: ScanTally,
    /// Open ports, sorted by port number.
    pub open: Vec<ScanOutcome>,
}

impl ScanReport {
    /// Port numbers found open.
    pub fn open_ports(&self) -> Vec<u16> {
        self.open.iter().map(|o| o.port().as_u16()).collect()
    }
}

/// Execute a complete TCP connect scan.
pub fn run_scan(config: &ScanConfig) -> ScanResult<ScanReport> {
    let prober = TcpProber::new(
        config.host.as_str(),
        config.connect_timeout,
        config.banner_timeout,
    )
    .with_banners(config.grab_banners);

    run_scan_with(config, Arc::new(prober))
}

/// Execute a complete scan using the given prober.
pub fn run_scan_with<P>(config: &ScanConfig, prober: Arc<P>) -> ScanResult<ScanReport>
where
    P: Prober + ?Sized + 'static,
{
    config.validate()?;

    let started_at = Utc::now();
    let start_time = Instant::now();
    let total_ports = config.range.len();
    let workers = worker_count(config.threads, total_ports);

    info!(
        host = %config.host,
        ports = %config.range,
        workers,
        "scan started"
    );

    let progress = config.progress.then(|| progress_bar(total_ports));

    let ctx = WorkerContext {
        queue: Arc::new(JobQueue::new()),
        prober,
        collector: Arc::new(ResultCollector::new()),
        shutdown: ShutdownSignal::new(),
        poll_interval: config.poll_interval,
        progress: progress.clone(),
    };

    let pool = WorkerPool::spawn(workers, &ctx)?;

    for port in config.range.iter() {
        ctx.queue.enqueue(port);
        debug!(port = port.as_u16(), "port enqueued");
    }

    wait_for_drain(&ctx.queue, &pool, &ctx.collector, config.poll_interval);
    ctx.shutdown.trigger();
    ctx.queue.close();
    let started = pool.size();
    pool.join();

    if let Some(pb) = progress {
        pb.finish_with_message("scan complete");
    }

    let WorkerContext { collector, .. } = ctx;
    let tally = collector.summary();
    let mut open = match Arc::try_unwrap(collector) {
        Ok(collector) => collector.drain(),
        Err(shared) => shared.snapshot(),
    };
    open.sort_by_key(ScanOutcome::port);

    let duration_ms = start_time.elapsed().as_millis() as u64;
    info!(
        host = %config.host,
        open = tally.open,
        closed = tally.closed,
        timed_out = tally.timed_out,
        errors = tally.socket_errors + tally.unexpected,
        duration_ms,
        "scan finished"
    );

    Ok(ScanReport {
        host: config.host.clone(),
        start_port: config.range.start(),
        end_port: config.range.end(),
        ports_scanned: total_ports,
        workers: started,
        started_at,
        completed_at: Utc::now(),
        duration_ms,
        tally,
        open,
    })
}

/// Block on the queue's join barrier.
///
/// If every worker has died while ports are still queued, nobody would ever
/// acknowledge them; the coordinator then settles them itself.
fn wait_for_drain(
    queue: &JobQueue,
    pool: &WorkerPool,
    collector: &ResultCollector,
    poll_interval: Duration,
) {
    while !queue.join_timeout(poll_interval) {
        if pool.live_workers() == 0 {
            recover_orphaned(queue, collector);
        }
    }
}

/// Acknowledge every still-queued port as an unexpected failure.
///
/// Returns the number of ports settled this way.
pub(crate) fn recover_orphaned(queue: &JobQueue, collector: &ResultCollector) -> usize {
    let mut recovered = 0;
    while let Some(port) = queue.dequeue(Duration::ZERO) {
        error!(
            port = port.as_u16(),
            critical = true,
            "no live workers left, abandoning port"
        );
        collector.record(ScanOutcome::Errored {
            port,
            kind: ProbeErrorKind::Unexpected,
        });
        if let Err(e) = queue.acknowledge(port) {
            error!(error = %e, "acknowledgement rejected");
        }
        recovered += 1;
    }
    recovered
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
