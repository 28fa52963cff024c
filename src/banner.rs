//! Banner grabbing for open TCP connections.
//!
//! Attempts to retrieve a service banner over an already-established
//! connection. Every failure path yields `None`: a missing banner never
//! changes the status of the port it was read from.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::trace;

/// Maximum bytes to read for a banner.
const MAX_BANNER_SIZE: usize = 1024;

/// Maximum characters kept after sanitizing.
const MAX_BANNER_CHARS: usize = 256;

/// Probe sent to well-known HTTP ports.
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Probe sent to everything else.
const LINE_PROBE: &[u8] = b"\r\n";

/// Grab a banner from an open TCP stream.
///
/// This function:
/// 1. Reads any data the service sends immediately upon connection
/// 2. If nothing arrives, sends a minimal probe and reads once more
///
/// Each read and write is bounded by `timeout`. Returns `None` if no
/// printable banner could be retrieved.
pub fn grab_banner(stream: &mut TcpStream, port: u16, timeout: Duration) -> Option<String> {
    if let Err(e) = stream
        .set_read_timeout(Some(timeout))
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
    {
        trace!(port, error = %e, "cannot arm banner timeout");
        return None;
    }

    let mut buffer = [0u8; MAX_BANNER_SIZE];

    // Services such as SSH, FTP and SMTP speak first
    match stream.read(&mut buffer) {
        Ok(0) => return None,
        Ok(n) => return non_empty(sanitize_banner(&buffer[..n])),
        Err(e) => trace!(port, error = %e, "no unsolicited banner"),
    }

    let probe = if is_http_port(port) { HTTP_PROBE } else { LINE_PROBE };
    if let Err(e) = stream.write_all(probe) {
        trace!(port, error = %e, "banner probe write failed");
        return None;
    }

    match stream.read(&mut buffer) {
        Ok(n) if n > 0 => non_empty(sanitize_banner(&buffer[..n])),
        Ok(_) => None,
        Err(e) => {
            trace!(port, error = %e, "no banner after probe");
            None
        }
    }
}

fn non_empty(banner: String) -> Option<String> {
    if banner.is_empty() {
        None
    } else {
        Some(banner)
    }
}

/// Check if a port is commonly used for HTTP services.
fn is_http_port(port: u16) -> bool {
    matches!(
        port,
        80 | 443 | 8000 | 8008 | 8080 | 8081 | 8082 | 8083 | 8443 | 8888 | 9000 | 9090
    )
}

/// Decode banner bytes as text, replacing control characters and limiting length.
///
/// Invalid UTF-8 sequences become U+FFFD. Line breaks and tabs are treated as
/// spaces and runs of spaces are collapsed.
pub(crate) fn sanitize_banner(data: &[u8]) -> String {
    let data = &data[..data.len().min(MAX_BANNER_SIZE)];
    let text = String::from_utf8_lossy(data);

    let mut result = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars().take(MAX_BANNER_CHARS) {
        let c = match c {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_control() => '.',
            c => c,
        };
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        result.push(c);
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_sanitize_banner() {
        let data = b"SSH-2.0-OpenSSH_8.9\r\n";
        assert_eq!(sanitize_banner(data), "SSH-2.0-OpenSSH_8.9");
    }

    #[test]
    fn test_sanitize_binary_data() {
        let data = b"\x00\x01Hello\x02World\x03";
        assert_eq!(sanitize_banner(data), "..Hello.World.");
    }

    #[test]
    fn test_sanitize_keeps_non_ascii_text() {
        assert_eq!(sanitize_banner("220 Привет FTP".as_bytes()), "220 Привет FTP");
        assert_eq!(
            sanitize_banner("220 Bienvenue à café\r\n".as_bytes()),
            "220 Bienvenue à café"
        );
    }

    #[test]
    fn test_sanitize_invalid_utf8() {
        let data = b"SSH-2.0-\xff\xfeX";
        assert_eq!(sanitize_banner(data), "SSH-2.0-\u{FFFD}\u{FFFD}X");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        let data = b"220   mail.example.com\r\n\r\n ESMTP";
        assert_eq!(sanitize_banner(data), "220 mail.example.com ESMTP");
    }

    #[test]
    fn test_sanitize_truncates() {
        let data = vec![b'A'; 2000];
        assert_eq!(sanitize_banner(&data).len(), MAX_BANNER_CHARS);

        let data = "é".repeat(500);
        assert_eq!(sanitize_banner(data.as_bytes()).chars().count(), MAX_BANNER_CHARS);
    }

    #[test]
    fn test_is_http_port() {
        assert!(is_http_port(80));
        assert!(is_http_port(8080));
        assert!(!is_http_port(22));
    }

    #[test]
    fn test_unsolicited_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(b"SSH-2.0-Test_1.0\r\n").unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        let banner = grab_banner(&mut stream, addr.port(), Duration::from_millis(500));
        server.join().unwrap();

        assert_eq!(banner.as_deref(), Some("SSH-2.0-Test_1.0"));
    }

    #[test]
    fn test_non_ascii_banner_over_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all("220 Bienvenue à café\r\n".as_bytes()).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        let banner = grab_banner(&mut stream, addr.port(), Duration::from_millis(500));
        server.join().unwrap();

        assert_eq!(banner.as_deref(), Some("220 Bienvenue à café"));
    }

    #[test]
    fn test_banner_after_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let n = conn.read(&mut buf).unwrap();
            assert_eq!(&buf[..n], LINE_PROBE);
            conn.write_all(b"hello after probe\n").unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        let banner = grab_banner(&mut stream, addr.port(), Duration::from_millis(200));
        server.join().unwrap();

        assert_eq!(banner.as_deref(), Some("hello after probe"));
    }

    #[test]
    fn test_silent_service_yields_none() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (conn, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(400));
            drop(conn);
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        let banner = grab_banner(&mut stream, addr.port(), Duration::from_millis(100));
        server.join().unwrap();

        assert!(banner.is_none());
    }

    #[test]
    fn test_zero_timeout_is_not_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut stream = TcpStream::connect(addr).unwrap();

        assert!(grab_banner(&mut stream, addr.port(), Duration::ZERO).is_none());
    }
}
