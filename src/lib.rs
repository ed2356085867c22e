//! Black-box conformance runner for the `abstract_vm` interpreter.
//!
//! Fixtures (`*.avm`) are discovered under a root directory, run against the
//! subject binary either as a file argument or piped on stdin, and checked
//! against their `.out` / `.err` companions.

pub use crate::checker::{OutputMismatch, Verdict};
pub use crate::config::{ConfigFile, HarnessConfig};
pub use crate::discovery::{CaseKind, Fixture, FixtureDiscoverer, FixtureSet, InvocationMode};
pub use crate::errors::HarnessError;
pub use crate::harness::{Harness, RunOutcome};
pub use crate::normalize::{ensure_stdin_terminator, ensure_stdin_terminator_bytes};
pub use crate::report::{Reporter, RunSummary};
pub use crate::runner::{ExecutionResult, SubjectRunner};

pub mod checker;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod harness;
pub mod normalize;
pub mod report;
pub mod runner;
