//! watchdog-demo - Watchdog interruption demo
//!
//! Arms the process-wide watchdog, runs a busy loop of filesystem calls with a
//! checkpoint after each one, and reports how the watchdog cut the loop short.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod demo;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::demo::{Backend, DemoOptions};
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "watchdog-demo")]
#[command(about = "Arm a watchdog and let it interrupt a busy loop")]
#[command(version)]
#[command(long_about = "
watchdog-demo arms the process-wide watchdog for --feed-ms milliseconds and
then spins for up to --busy-ms milliseconds without feeding it. Each iteration
performs a filesystem call followed by a watchdog checkpoint.

The run succeeds when the watchdog interrupts the loop and exits with code 2
when the loop runs to completion. Use --json for machine-readable output.
")]
struct Cli {
    /// Watchdog timeout in milliseconds
    #[arg(
        long,
        default_value_t = 1_000,
        env = "WATCHDOG_DEMO_FEED_MS",
        allow_hyphen_values = true
    )]
    feed_ms: i64,

    /// How long the busy loop runs if nothing interrupts it
    #[arg(long, default_value_t = 5_000, env = "WATCHDOG_DEMO_BUSY_MS")]
    busy_ms: u64,

    /// Interrupt delivery backend
    #[arg(long, value_enum, default_value_t = Backend::Safepoint)]
    backend: Backend,

    /// Output format (human-readable or JSON)
    #[arg(long, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("watchdog_demo={log_level},exceptional_watchdog={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(e.downcast_ref::<CliError>().map_or(1, CliError::exit_code))
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let options = DemoOptions {
        feed_ms: cli.feed_ms,
        busy_ms: cli.busy_ms,
        backend: cli.backend,
    };
    let report = demo::run(&options)?;
    output::print_report(&report, cli.json)
}
