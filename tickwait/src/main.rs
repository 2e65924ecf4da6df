//! # tickwait - Main Entry Point
//!
//! Spawns one worker, supervises it to completion and optionally writes a
//! JSON report. Console markers go to stdout, diagnostics to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use tickwait::cli::Args;
use tickwait::export::ReportExporter;
use tickwait::preflight::run_preflight_checks;
use tickwait::supervision::Supervisor;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.supervisor_config().context("Invalid timer configuration")?;

    run_preflight_checks(&config.timer, args.quiet)?;

    let supervisor = Supervisor::new(config);
    let report = supervisor
        .run(&mut io::stdout(), || writeln!(io::stdout(), "SIG"))
        .context("Supervision failed")?;
    info!("Supervision report: {report:?}");

    if let Some(ref report_path) = args.report {
        let file = File::create(report_path)
            .with_context(|| format!("Failed to create {}", report_path.display()))?;
        ReportExporter::new(config.timer, config.worker)
            .export(&report, BufWriter::new(file))
            .context("Failed to export report")?;
        if !args.quiet {
            eprintln!("saved: {}", report_path.display());
        }
    }

    if !args.quiet {
        eprintln!(
            "worker exited: {:?}, {} interruptions, {} heartbeats, {}ms (user {}us, sys {}us, maxrss {}KiB)",
            report.status.termination(),
            report.interruptions,
            report.heartbeats,
            report.elapsed_ms,
            report.usage.user_time_us,
            report.usage.system_time_us,
            report.usage.max_rss_kib,
        );
    }

    Ok(())
}
