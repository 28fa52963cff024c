//! Service labels for well-known port numbers.
//!
//! A static, read-only table built once on first use. Lookups are total:
//! ports missing from the table map to [`UNKNOWN_SERVICE`].

use std::collections::HashMap;
use std::sync::LazyLock;

/// Label reported for ports with no catalog entry.
pub const UNKNOWN_SERVICE: &str = "Unknown Service";

/// Static map of well-known ports to service labels.
static PORT_SERVICES: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert(20, "FTP-data");
    m.insert(21, "FTP");
    m.insert(22, "SSH");
    m.insert(23, "Telnet");
    m.insert(25, "SMTP");
    m.insert(53, "DNS");
    m.insert(80, "HTTP");
    m.insert(110, "POP3");
    m.insert(143, "IMAP");
    m.insert(443, "HTTPS");
    m.insert(3306, "MySQL");
    m.insert(3389, "RDP");
    m.insert(5900, "VNC");
    m.insert(8080, "HTTP-alt");

    m
});

/// Look up the service name for a port, if the catalog knows it.
pub fn get_service_name(port: u16) -> Option<&'static str> {
    PORT_SERVICES.get(&port).copied()
}

/// Get the label to report for a port.
///
/// Returns [`UNKNOWN_SERVICE`] if the port is not recognized.
pub fn lookup(port: u16) -> &'static str {
    get_service_name(port).unwrap_or(UNKNOWN_SERVICE)
}
