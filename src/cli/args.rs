//! Command-line arguments for the conformance runner.
//!
//! Uses the `clap` derive API. Every flag is an override on top of the
//! defaults and the optional `conformance.yaml`; see [`crate::config`].

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use termcolor::ColorChoice;

use crate::config::DEFAULT_FIXTURE_ROOT;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "avm-conformance",
    version,
    about = "Run the abstract_vm conformance fixtures and report pass/fail."
)]
pub struct ConformanceArgs {
    /// Directory containing the fixtures.
    #[arg(default_value = DEFAULT_FIXTURE_ROOT)]
    pub root: PathBuf,

    /// Interpreter binary under test. Defaults to `abstract_vm` beside ROOT.
    #[arg(long)]
    pub subject: Option<PathBuf>,

    /// Name of the subdirectory of ROOT whose fixtures are piped on stdin.
    #[arg(long)]
    pub stdin_dir: Option<String>,

    /// Config file. Defaults to ROOT/conformance.yaml when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only run fixtures whose relative path contains this text (case-insensitive).
    #[arg(short, long)]
    pub filter: Option<String>,

    /// When to colour the report.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Log discovery and subject invocations to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// `Auto` only colours when stdout is a terminal.
    pub fn to_choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}
