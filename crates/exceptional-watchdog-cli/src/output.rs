//! Output formatting for watchdog-demo

use anyhow::{Error, Result};
use colored::Colorize;
use serde_json::json;

use crate::demo::DemoReport;
use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::NotInterrupted { .. }) => "not_interrupted",
        Some(CliError::ValidationError(_)) => "validation",
        Some(CliError::Watchdog(_)) => "watchdog",
        Some(CliError::JsonError(_)) => "json",
        None => "unknown",
    }
}

/// Print the demo report in the specified format
pub fn print_report(report: &DemoReport, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "success": true,
            "report": report
        });
        println!("{}", serde_json::to_string_pretty(&output).map_err(CliError::from)?);
        return Ok(());
    }

    println!(
        "{} after {} ms ({} iterations, {} backend)",
        "Interrupted".green().bold(),
        report.elapsed_ms,
        report.iterations,
        report.backend
    );
    println!("  Feed timeout:   {} ms", report.feed_ms);
    println!("  Busy loop:      {} ms", report.busy_ms);
    println!("  Generation:     {}", report.generation);
    println!("  Fired late by:  {} us", report.lateness_us);
    println!("  Re-arm check:   {:?}", report.rearm);
    println!(
        "  Counters:       feeds={} fires={} disarms={} observed={}",
        report.stats.feeds,
        report.stats.fires,
        report.stats.disarms,
        report.stats.interrupts_observed
    );
    Ok(())
}
