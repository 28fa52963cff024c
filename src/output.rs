//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of scan results.
//! Only open ports are ever listed; other outcomes appear as totals.

use crate::cli::OutputFormat;
use crate::scanner::{ScanConfig, ScanReport};
use console::style;
use std::io::{self, Write};

/// Format and print scan results according to the specified format.
pub fn print_results(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, report, format)
}

/// Format scan results into any writer.
pub fn write_results<W: Write>(out: &mut W, report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => write_plain(out, report),
        OutputFormat::Json => write_json(out, report),
        OutputFormat::Csv => write_csv(out, report),
    }
}

fn write_plain<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    let rule = "───────────────────────────────────────────────────────────────";

    writeln!(out)?;
    writeln!(
        out,
        "  {} {}  ports {}-{}",
        style("Target:").bold(),
        report.host,
        report.start_port,
        report.end_port
    )?;
    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s by {} workers",
        style("Statistics:").bold(),
        report.ports_scanned,
        report.duration_ms as f64 / 1000.0,
        report.workers
    )?;
    writeln!(
        out,
        "               {} open, {} closed, {} timed out, {} errors",
        style(report.tally.open).green().bold(),
        style(report.tally.closed).red(),
        style(report.tally.timed_out).yellow(),
        style(report.tally.socket_errors + report.tally.unexpected).yellow()
    )?;
    writeln!(out)?;

    if report.open.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "  {}", style(rule).dim())?;
    writeln!(
        out,
        "  {:>6}  {:<16}  {}",
        style("PORT").bold(),
        style("SERVICE").bold(),
        style("BANNER").bold()
    )?;
    writeln!(out, "  {}", style(rule).dim())?;

    for outcome in &report.open {
        let banner = outcome
            .banner()
            .map(|b| truncate_string(b, 40))
            .unwrap_or_default();
        writeln!(
            out,
            "  {:>6}  {:<16}  {}",
            style(outcome.port()).green().bold(),
            outcome.service().unwrap_or_default(),
            style(banner).dim()
        )?;
    }

    writeln!(out, "  {}", style(rule).dim())?;
    writeln!(out)?;
    Ok(())
}

fn write_json<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

fn write_csv<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["port", "service", "banner"])?;
    for outcome in &report.open {
        wtr.write_record([
            outcome.port().to_string().as_str(),
            outcome.service().unwrap_or_default(),
            outcome.banner().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(config: &ScanConfig) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("portsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {}",
        style("•").dim(),
        style(&config.host).white().bold()
    );
    println!(
        "{} Scanning {} ports ({}) with up to {} threads...",
        style("•").dim(),
        style(config.range.len()).white().bold(),
        config.range,
        config.threads
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ScanOutcome, ScanTally};
    use crate::types::Port;
    use chrono::Utc;

    fn port(p: u16) -> Port {
        Port::new(p).unwrap()
    }

    fn report(open: Vec<ScanOutcome>) -> ScanReport {
        ScanReport {
            host: "192.0.2.10".to_string(),
            start_port: port(1),
            end_port: port(100),
            ports_scanned: 100,
            workers: 100,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_ms: 1250,
            tally: ScanTally {
                open: open.len(),
                closed: 100 - open.len(),
                ..ScanTally::default()
            },
            open,
        }
    }

    fn render(report: &ScanReport, format: OutputFormat) -> String {
        let mut buf = Vec::new();
        write_results(&mut buf, report, format).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_plain_lists_open_ports() {
        let text = render(
            &report(vec![
                ScanOutcome::open(port(22), "SSH", Some("SSH-2.0-OpenSSH_9.6".into())),
                ScanOutcome::open(port(80), "HTTP", None),
            ]),
            OutputFormat::Plain,
        );
        assert!(text.contains("192.0.2.10"));
        assert!(text.contains("SSH-2.0-OpenSSH_9.6"));
        assert!(text.contains("HTTP"));
    }

    #[test]
    fn test_plain_without_open_ports() {
        let text = render(&report(Vec::new()), OutputFormat::Plain);
        assert!(text.contains("No open ports found."));
    }

    #[test]
    fn test_json_output() {
        let text = render(
            &report(vec![ScanOutcome::open(port(8080), "HTTP-alt", None)]),
            OutputFormat::Json,
        );
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["host"], "192.0.2.10");
        assert_eq!(value["tally"]["open"], 1);
        assert_eq!(value["open"][0]["port"], 8080);
        assert_eq!(value["open"][0]["service"], "HTTP-alt");
    }

    #[test]
    fn test_csv_output() {
        let text = render(
            &report(vec![
                ScanOutcome::open(port(21), "FTP", Some("220 (vsFTPd 3.0.5)".into())),
                ScanOutcome::open(port(443), "HTTPS", None),
            ]),
            OutputFormat::Csv,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "port,service,banner");
        assert_eq!(lines[1], "21,FTP,220 (vsFTPd 3.0.5)");
        assert_eq!(lines[2], "443,HTTPS,");
    }
}
