//! The conformance runner's command-line entry point.
//!
//! Parses arguments, layers configuration, sets up logging, runs the
//! [`Harness`] and turns its outcome into a process exit code.

use std::process;

use clap::Parser;

use crate::cli::args::ConformanceArgs;
use crate::config::{ConfigFile, HarnessConfig};
use crate::errors::HarnessError;
use crate::harness::{Harness, RunOutcome};

pub mod args;

/// The main entry point for the CLI. Never returns.
pub fn run() -> ! {
    let args = ConformanceArgs::parse();
    init_logging(args.verbose);

    let code = match build_config(args) {
        Ok(config) => finish(Harness::new(config).run_to_stdout()),
        Err(err) => report_error(err),
    };
    process::exit(code);
}

/// Defaults, then the config file, then command-line flags.
pub fn build_config(args: ConformanceArgs) -> Result<HarnessConfig, HarnessError> {
    let mut config = HarnessConfig::for_root(&args.root);

    let file = match &args.config {
        Some(path) => Some(ConfigFile::load(path)?),
        None => ConfigFile::load_default(&args.root)?,
    };
    if let Some(file) = file {
        config.apply_file(file);
    }

    if let Some(subject) = args.subject {
        config.subject = subject;
    }
    if let Some(stdin_dir) = args.stdin_dir {
        config.stdin_dir = stdin_dir;
    }
    if let Some(filter) = args.filter {
        config.filter = Some(filter);
    }
    config.color = args.color.to_choice();
    Ok(config)
}

fn finish(outcome: RunOutcome) -> i32 {
    let code = outcome.exit_code();
    if let RunOutcome::Aborted(err) = outcome {
        return report_error(err);
    }
    code
}

fn report_error(err: HarnessError) -> i32 {
    let code = err.exit_code();
    let report = miette::Report::new(err);
    eprintln!("{report:?}");
    code
}

/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}
