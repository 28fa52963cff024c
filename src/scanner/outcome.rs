//! Probe outcomes and the `Prober` abstraction.
//!
//! Defines the result taxonomy produced once per port, and the trait that
//! lets the worker pool drive any probing implementation.

use crate::types::Port;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a probe ended without a usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// The connect attempt exceeded its bound.
    Timeout,
    /// Transport failure other than a refusal.
    SocketError,
    /// Resource exhaustion or a fault inside the prober itself.
    Unexpected,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::SocketError => write!(f, "socket error"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Result of probing a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome {
    /// A connection was accepted.
    Open {
        port: Port,
        service: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        banner: Option<String>,
    },
    /// The connection was actively refused.
    Closed { port: Port },
    /// The probe failed for some other reason.
    Errored { port: Port, kind: ProbeErrorKind },
}

impl ScanOutcome {
    /// Build an open outcome.
    pub fn open(port: Port, service: impl Into<String>, banner: Option<String>) -> Self {
        Self::Open {
            port,
            service: service.into(),
            banner,
        }
    }

    /// The port this outcome describes.
    pub fn port(&self) -> Port {
        match self {
            Self::Open { port, .. } | Self::Closed { port } | Self::Errored { port, .. } => *port,
        }
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The service label of an open port.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Open { service, .. } => Some(service),
            _ => None,
        }
    }

    /// The banner of an open port, if one was captured.
    pub fn banner(&self) -> Option<&str> {
        match self {
            Self::Open { banner, .. } => banner.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open {
                port,
                service,
                banner: Some(banner),
            } => write!(f, "{} open - {} - {}", port, service, banner),
            Self::Open { port, service, .. } => write!(f, "{} open - {}", port, service),
            Self::Closed { port } => write!(f, "{} closed", port),
            Self::Errored { port, kind } => write!(f, "{} error ({})", port, kind),
        }
    }
}

/// Trait for port probing implementations.
///
/// A prober must be total: every call produces exactly one outcome, and
/// recoverable failures are folded into [`ScanOutcome::Closed`] or
/// [`ScanOutcome::Errored`] rather than surfaced as errors.
pub trait Prober: Send + Sync {
    /// Probe a single port.
    fn probe(&self, port: Port) -> ScanOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(p: u16) -> Port {
        Port::new(p).unwrap()
    }

    #[test]
    fn test_outcome_accessors() {
        let open = ScanOutcome::open(port(22), "SSH", Some("SSH-2.0-OpenSSH_9.6".into()));
        assert!(open.is_open());
        assert_eq!(open.port(), port(22));
        assert_eq!(open.service(), Some("SSH"));
        assert_eq!(open.banner(), Some("SSH-2.0-OpenSSH_9.6"));

        let closed = ScanOutcome::Closed { port: port(23) };
        assert!(!closed.is_open());
        assert_eq!(closed.service(), None);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            ScanOutcome::open(port(80), "HTTP", None).to_string(),
            "80 open - HTTP"
        );
        assert_eq!(
            ScanOutcome::Errored {
                port: port(81),
                kind: ProbeErrorKind::Timeout
            }
            .to_string(),
            "81 error (timeout)"
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(ScanOutcome::open(port(8080), "HTTP-alt", None)).unwrap();
        assert_eq!(json["status"], "open");
        assert_eq!(json["port"], 8080);
        assert_eq!(json["service"], "HTTP-alt");
        assert!(json.get("banner").is_none());
    }
}
