//! TCP connect prober.
//!
//! Performs standard TCP connect probes using the operating system's socket
//! API. This is the most reliable probing method but also the most
//! detectable, as it completes the full TCP handshake.

use crate::banner::grab_banner;
use crate::scanner::outcome::{ProbeErrorKind, Prober, ScanOutcome};
use crate::services;
use crate::types::{resolve_host, Port, ScanTarget};
use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// TCP connect prober.
///
/// Uses blocking `connect()` calls with an explicit timeout, so it is meant
/// to be driven from a pool of OS threads. Does not require elevated
/// privileges. The host is resolved on the first probe and the result,
/// success or failure, is reused for every later port.
#[derive(Debug, Clone)]
pub struct TcpProber {
    host: String,
    connect_timeout: Duration,
    banner_timeout: Duration,
    grab_banners: bool,
    resolved: OnceLock<Result<Vec<IpAddr>, Arc<io::Error>>>,
}

impl TcpProber {
    /// Create a new TCP prober.
    ///
    /// # Arguments
    /// * `host` - Hostname or literal IP to probe
    /// * `connect_timeout` - Bound on each connection attempt
    /// * `banner_timeout` - Bound on each banner read or write
    pub fn new(host: impl Into<String>, connect_timeout: Duration, banner_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            connect_timeout,
            banner_timeout,
            grab_banners: true,
            resolved: OnceLock::new(),
        }
    }

    /// Enable or disable banner grabbing on open ports.
    pub fn with_banners(mut self, grab_banners: bool) -> Self {
        self.grab_banners = grab_banners;
        self
    }

    /// The host being probed.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Addresses of the host, resolved once.
    fn addresses(&self) -> Result<&[IpAddr], &io::Error> {
        let resolved = self.resolved.get_or_init(|| {
            let result = resolve_host(&self.host);
            match &result {
                Ok(addrs) => debug!(host = %self.host, ?addrs, "host resolved"),
                Err(e) => error!(host = %self.host, error = %e, "cannot resolve host"),
            }
            result.map_err(Arc::new)
        });
        match resolved {
            Ok(addrs) => Ok(addrs.as_slice()),
            Err(e) => Err(&**e),
        }
    }

    /// Attempt to connect to every resolved address until one accepts.
    fn attempt_connect(&self, addrs: &[IpAddr], port: Port) -> io::Result<TcpStream> {
        let mut last_err = None;
        for &ip in addrs {
            let addr = SocketAddr::new(ip, port.as_u16());
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable)))
    }
}

impl Prober for TcpProber {
    fn probe(&self, port: Port) -> ScanOutcome {
        let target = ScanTarget::new(self.host.as_str(), port);
        let start = Instant::now();

        // Resolution failure was logged once when it happened
        let addrs = match self.addresses() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!(%target, "skipping port of unresolved host");
                return classify_connect_error(port, e);
            }
        };

        match self.attempt_connect(addrs, port) {
            Ok(mut stream) => {
                let service = services::lookup(port.as_u16());
                let banner = if self.grab_banners {
                    grab_banner(&mut stream, port.as_u16(), self.banner_timeout)
                } else {
                    None
                };

                info!(
                    %target,
                    service,
                    banner = banner.as_deref().unwrap_or(""),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "port open"
                );
                ScanOutcome::open(port, service, banner)
            }
            Err(e) => {
                let outcome = classify_connect_error(port, &e);
                match &outcome {
                    ScanOutcome::Closed { .. } => debug!(%target, "port closed"),
                    ScanOutcome::Errored {
                        kind: ProbeErrorKind::Timeout,
                        ..
                    } => warn!(%target, "timeout scanning port"),
                    ScanOutcome::Errored {
                        kind: ProbeErrorKind::Unexpected,
                        ..
                    } => error!(%target, error = %e, critical = true, "unexpected error scanning port"),
                    _ => error!(%target, error = %e, "socket error scanning port"),
                }
                outcome
            }
        }
    }
}

/// Map a failed connect attempt onto the outcome taxonomy.
pub fn classify_connect_error(port: Port, err: &io::Error) -> ScanOutcome {
    let kind = match err.kind() {
        io::ErrorKind::ConnectionRefused => return ScanOutcome::Closed { port },
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeErrorKind::Timeout,
        io::ErrorKind::OutOfMemory => ProbeErrorKind::Unexpected,
        _ if is_resource_exhaustion(err) => ProbeErrorKind::Unexpected,
        _ => ProbeErrorKind::SocketError,
    };
    ScanOutcome::Errored { port, kind }
}

#[cfg(unix)]
fn is_resource_exhaustion(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_err: &io::Error) -> bool {
    false
}
