//! portsweep binary: parse arguments, set up logging, run one scan and print
//! the open ports.

use anyhow::{Context, Result};
use clap::Parser;
use portsweep::cli::{Args, OutputFormat};
use portsweep::config::{AppSettings, Paths};
use portsweep::logging::init_logging;
use portsweep::output;
use portsweep::scanner::run_scan;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let paths = Paths::discover().ok();
    let settings = match (&args.config, &paths) {
        (Some(path), _) => AppSettings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        (None, Some(paths)) => AppSettings::load(paths).context("Failed to load settings")?,
        (None, None) => AppSettings::default(),
    };

    let log_dir = if args.no_log_file {
        None
    } else {
        args.log_dir
            .clone()
            .or_else(|| settings.log_dir.clone())
            .or_else(|| paths.as_ref().map(Paths::log_dir))
    };
    let _log_guard = init_logging(args.log_level(&settings), log_dir.as_deref(), !args.quiet)?;

    let config = args.scan_config(&settings)?;

    let plain = args.output == OutputFormat::Plain;
    if plain && !args.quiet {
        output::print_scan_header(&config);
    }

    let report = run_scan(&config)?;

    output::print_results(&report, args.output).context("Failed to write results")?;
    if plain && !args.quiet {
        output::print_success(&format!(
            "Scan of {} complete: {} open of {} ports",
            report.host,
            report.open.len(),
            report.ports_scanned
        ));
    }

    Ok(())
}
