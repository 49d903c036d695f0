// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! RDRAND Writer - dumps hardware random numbers to a file
//!
//! Draws 64-bit samples from the processor's RDRAND instruction and streams them,
//! through a fixed-capacity buffer, to an output file until the requested size is
//! reached.
//!
//! # Usage
//!
//! ```text
//! rdrand-writer [SIZE_GB] [OUTPUT]
//! ```
//!
//! `SIZE_GB` defaults to 0.1, `OUTPUT` to `rdrand_output.bin`. Tunables can also
//! be set through `RDRAND_*` environment variables; flags take precedence.
//!
//! # Output format
//!
//! Raw native-endian `u64` values in generation order: no header, no length
//! prefix, no checksum. Files from hosts of different endianness are not
//! bit-for-bit comparable.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use rdrand_core::{
    config::GeneratorConfig,
    generator::RunReport,
    progress::{Progress, ProgressObserver, TracingProgress},
    session::{ensure_supported, exit_code, Session},
    source::{HardwareRng, RdRand},
    Error, Request, BYTES_IN_GB,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rdrand-writer")]
#[command(about = "RDRAND Writer - Dumps hardware random numbers to a file", long_about = None)]
#[command(version)]
struct Args {
    /// Size of data to generate in gigabytes
    #[arg(allow_hyphen_values = true)]
    size_gb: Option<String>,

    /// Output file path
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Buffer capacity in samples (overrides RDRAND_BUFFER_SAMPLES)
    #[arg(long)]
    buffer_samples: Option<usize>,

    /// Attempts per draw before giving up (overrides RDRAND_RETRY_LIMIT)
    #[arg(long)]
    retry_limit: Option<u32>,

    /// Overlap generation and file writes (overrides RDRAND_PIPELINED)
    #[arg(long)]
    pipelined: bool,

    /// Suppress the progress line
    #[arg(short, long)]
    quiet: bool,

    /// Print a JSON run summary to stdout on success
    #[arg(long)]
    json_summary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Overwrites a single console line with the current progress
struct ConsoleProgress {
    quiet: bool,
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&mut self, progress: &Progress) {
        TracingProgress.on_progress(progress);
        if self.quiet {
            return;
        }

        let mut stdout = std::io::stdout().lock();
        // Advisory output; a closed stdout must not stop the run.
        let _ = write!(
            stdout,
            "\rProgress: {:.1}% ({:.2} GB / {:.2} GB)",
            progress.percent(),
            progress.bytes_generated as f64 / BYTES_IN_GB as f64,
            progress.bytes_total as f64 / BYTES_IN_GB as f64,
        );
        let _ = stdout.flush();
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .with_context(|| format!("Invalid log level '{}'", args.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match args.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow!("{}", e))
}

fn load_config(args: &Args) -> rdrand_core::Result<GeneratorConfig> {
    let mut config = GeneratorConfig::from_env()?;

    if let Some(buffer_samples) = args.buffer_samples {
        config.buffer_samples = buffer_samples;
    }
    if let Some(retry_limit) = args.retry_limit {
        config.retry_limit = retry_limit;
    }
    if args.pipelined {
        config.pipelined = true;
    }

    config.validate()?;
    Ok(config)
}

fn run<R: HardwareRng>(args: &Args, rng: R) -> rdrand_core::Result<(Request, RunReport)> {
    // Hardware first: on an unsupported CPU nothing else is parsed or reported.
    ensure_supported(&rng)?;

    let config = load_config(args)?;
    let session = Session::new(config);

    let request = session.prepare(&rng, args.size_gb.as_deref(), args.output.as_deref())?;

    println!(
        "Generating {:.2} GB ({} bytes) of random data using RDRAND...",
        request.size_gb(),
        request.size_bytes()
    );
    println!("Writing output to: {}", request.path().display());

    let report = session.execute(&request, rng, ConsoleProgress { quiet: args.quiet })?;
    Ok((request, report))
}

fn report_failure(e: &Error) {
    if !e.is_pre_io() {
        // Finish any partially drawn progress line first.
        println!();
    }
    error!("{}", e);

    match e {
        Error::InvalidSize(_) => {
            eprintln!("Invalid data size. Please enter a positive number (GB).")
        }
        other => eprintln!("{}", other),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::from(1);
    }

    info!("RDRAND Writer v{}", rdrand_core::VERSION);

    let outcome = run(&args, RdRand::new());
    let code = exit_code(&outcome);

    match outcome {
        Ok((request, report)) => {
            println!(
                "\nRandom data successfully written to '{}'.",
                request.path().display()
            );
            info!(
                bytes = report.bytes_written,
                flushes = report.stats.flushes,
                retries = report.stats.retries,
                elapsed_secs = report.stats.elapsed_secs,
                "Throughput: {:.1} MiB/s",
                report.stats.throughput_mib_per_sec
            );

            if args.json_summary {
                let summary = serde_json::json!({
                    "path": request.path().display().to_string(),
                    "requested_bytes": request.size_bytes(),
                    "samples": report.samples,
                    "stats": report.stats,
                });
                println!("{}", summary);
            }
        }
        Err(e) => report_failure(&e),
    }

    ExitCode::from(code)
}
