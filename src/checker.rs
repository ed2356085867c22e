//! Expectation checking.
//!
//! Each fixture is either an accept case (`.out` present, optional `.err`
//! stderr check), a reject case (only `.err`), or invalid. The checker walks
//! the matching branch and stops at the first mismatch.

use std::fs;
use std::io;
use std::path::Path;

use crate::discovery::{CaseKind, Fixture};
use crate::runner::ExecutionResult;

/// Diagnostic for a fixture with neither companion.
pub const NO_EXPECTATION_MESSAGE: &str = "No expected .out or .err file found for this test";

/// Expected and actual stdout of an accept case that printed the wrong thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMismatch {
    pub expected: String,
    pub actual: String,
}

/// Outcome of checking one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail {
        message: String,
        mismatch: Option<OutputMismatch>,
    },
}

impl Verdict {
    pub fn fail(message: impl Into<String>) -> Self {
        Verdict::Fail {
            message: message.into(),
            mismatch: None,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn message(&self) -> &str {
        match self {
            Verdict::Pass => "OK",
            Verdict::Fail { message, .. } => message,
        }
    }

    pub fn mismatch(&self) -> Option<&OutputMismatch> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { mismatch, .. } => mismatch.as_ref(),
        }
    }
}

// =====================
// Case Dispatch
// =====================

/// Checks `result` against what `fixture` expects.
pub fn check(fixture: &Fixture, result: &ExecutionResult) -> Verdict {
    check_case(&fixture.case, result)
}

/// Checks `result` against a case kind; companion files are read here.
///
/// An accept case's `.err` is only read once exit code and stdout have matched.
pub fn check_case(case: &CaseKind, result: &ExecutionResult) -> Verdict {
    match case {
        CaseKind::Accept {
            expected_out,
            expected_err,
        } => {
            let expected = match read_expected_output(expected_out) {
                Ok(bytes) => bytes,
                Err(verdict) => return verdict,
            };
            let verdict = check_accept(&file_name(expected_out), &expected, result);
            match expected_err {
                Some(path) if verdict.passed() => match read_needle(path) {
                    Ok(needle) => check_stderr_contains(&needle, result),
                    Err(verdict) => verdict,
                },
                _ => verdict,
            }
        }
        CaseKind::Reject { expected_err } => match read_needle(expected_err) {
            Ok(needle) => check_reject(&needle, result),
            Err(verdict) => verdict,
        },
        CaseKind::Invalid => Verdict::fail(NO_EXPECTATION_MESSAGE),
    }
}

// =====================
// Expectation Branches
// =====================

/// Accept case: exit 0, then stdout byte-for-byte equal to `expected`.
///
/// `expected_name` labels the expected block in the mismatch message.
pub fn check_accept(expected_name: &str, expected: &[u8], result: &ExecutionResult) -> Verdict {
    if result.exit_code != 0 {
        return Verdict::fail(format!(
            "Expected exit code 0, got {}\nStderr:\n{}",
            result.exit_code,
            result.stderr_text()
        ));
    }
    if result.stdout != expected {
        let expected = String::from_utf8_lossy(expected).into_owned();
        let actual = result.stdout_text().into_owned();
        return Verdict::Fail {
            message: format!(
                "STDOUT mismatch\n--- expected ({}) ---\n{}\n--- got ---\n{}\n",
                expected_name, expected, actual
            ),
            mismatch: Some(OutputMismatch { expected, actual }),
        };
    }
    Verdict::Pass
}

/// Reject case: any non-zero exit, then the stderr needle.
pub fn check_reject(needle: &str, result: &ExecutionResult) -> Verdict {
    if result.exit_code == 0 {
        return Verdict::fail(format!(
            "Expected non-zero exit code, got 0\nStdout:\n{}",
            result.stdout_text()
        ));
    }
    check_stderr_contains(needle, result)
}

/// Stderr must contain `needle`; an empty needle always matches.
pub fn check_stderr_contains(needle: &str, result: &ExecutionResult) -> Verdict {
    let stderr = result.stderr_text();
    if needle.is_empty() || stderr.contains(needle) {
        return Verdict::Pass;
    }
    Verdict::fail(format!(
        "Expected stderr to contain: {}\nGot:\n{}",
        needle, stderr
    ))
}

// =====================
// Internal - Companion Files
// =====================

fn read_expected_output(path: &Path) -> Result<Vec<u8>, Verdict> {
    fs::read(path).map_err(|e| cannot_read(path, e))
}

fn read_needle(path: &Path) -> Result<String, Verdict> {
    fs::read_to_string(path)
        .map(|text| text.trim().to_string())
        .map_err(|e| cannot_read(path, e))
}

fn cannot_read(path: &Path, e: io::Error) -> Verdict {
    Verdict::fail(format!(
        "Cannot read expectation file {}: {}",
        path.display(),
        e
    ))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
