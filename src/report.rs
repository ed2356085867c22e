//! Console reporting.
//!
//! Output goes through a [`WriteColor`] so the same code drives a real
//! terminal ([`StandardStream`]) and an in-memory [`termcolor::Buffer`] in
//! tests.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::checker::{OutputMismatch, Verdict};
use crate::discovery::Fixture;

/// Running tally across the whole fixture set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    /// Labels of failed fixtures, in run order.
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn record(&mut self, label: &str, verdict: &Verdict) {
        self.total += 1;
        if !verdict.passed() {
            self.failed += 1;
            self.failures.push(label.to_string());
        }
    }

    pub fn passed(&self) -> usize {
        self.total - self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Prints per-fixture verdicts and the final summary.
pub struct Reporter<W: WriteColor> {
    out: W,
}

impl Reporter<StandardStream> {
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// `[PASS] label` in green, or `[FAIL] label` plus the diagnostic in red.
    pub fn fixture(&mut self, fixture: &Fixture, verdict: &Verdict) -> io::Result<()> {
        let label = fixture.label();
        match verdict {
            Verdict::Pass => {
                self.out.set_color(&bold(Color::Green))?;
                write!(self.out, "[PASS] {}", label)?;
                self.out.reset()?;
                writeln!(self.out)?;
            }
            Verdict::Fail { message, mismatch } => {
                self.out.set_color(&bold(Color::Red))?;
                write!(self.out, "[FAIL] {}\n{}", label, message)?;
                self.out.reset()?;
                writeln!(self.out)?;
                if let Some(mismatch) = mismatch {
                    self.diff(mismatch)?;
                }
            }
        }
        Ok(())
    }

    /// Blank line, `Summary: passed/total passed`, then the failed list if any.
    pub fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "Summary: {}/{} passed",
            summary.passed(),
            summary.total
        )?;
        if summary.has_failures() {
            writeln!(self.out)?;
            writeln!(self.out, "Failed tests:")?;
            for label in &summary.failures {
                writeln!(self.out, "  - {}", label)?;
            }
        }
        self.out.flush()
    }

    fn diff(&mut self, mismatch: &OutputMismatch) -> io::Result<()> {
        let changeset = Changeset::new(&mismatch.expected, &mismatch.actual, "\n");
        writeln!(self.out, "--- diff (-expected +got) ---")?;
        for diff in &changeset.diffs {
            match diff {
                Difference::Same(x) => {
                    self.out.reset()?;
                    write_prefixed(&mut self.out, ' ', x)?;
                }
                Difference::Rem(x) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                    write_prefixed(&mut self.out, '-', x)?;
                }
                Difference::Add(x) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    write_prefixed(&mut self.out, '+', x)?;
                }
            }
        }
        self.out.reset()
    }
}

fn bold(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    spec
}

fn write_prefixed<W: Write>(out: &mut W, prefix: char, chunk: &str) -> io::Result<()> {
    for line in chunk.split('\n') {
        writeln!(out, "{}{}", prefix, line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{CaseKind, InvocationMode};
    use std::path::PathBuf;
    use termcolor::Buffer;

    fn fixture(rel: &str, mode: InvocationMode) -> Fixture {
        Fixture {
            path: PathBuf::from("/t").join(rel),
            relative: PathBuf::from(rel),
            mode,
            case: CaseKind::Invalid,
        }
    }

    fn text(reporter: Reporter<Buffer>) -> String {
        String::from_utf8(reporter.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn pass_and_fail_lines() {
        let mut reporter = Reporter::new(Buffer::no_color());
        reporter
            .fixture(&fixture("add.avm", InvocationMode::File), &Verdict::Pass)
            .unwrap();
        reporter
            .fixture(
                &fixture("piped.avm", InvocationMode::Stdin),
                &Verdict::fail("Expected non-zero exit code, got 0\nStdout:\n"),
            )
            .unwrap();

        assert_eq!(
            text(reporter),
            "[PASS] add.avm\n[FAIL] piped.avm (stdin)\nExpected non-zero exit code, got 0\nStdout:\n\n"
        );
    }

    #[test]
    fn colored_output_wraps_lines_in_ansi() {
        let mut reporter = Reporter::new(Buffer::ansi());
        reporter
            .fixture(&fixture("add.avm", InvocationMode::File), &Verdict::Pass)
            .unwrap();
        let out = text(reporter);
        assert!(out.contains("\x1b["));
        assert!(out.contains("[PASS] add.avm"));
    }

    #[test]
    fn mismatch_renders_a_line_diff() {
        let mut reporter = Reporter::new(Buffer::no_color());
        let verdict = Verdict::Fail {
            message: "STDOUT mismatch".to_string(),
            mismatch: Some(OutputMismatch {
                expected: "1\n2\n".to_string(),
                actual: "1\n3\n".to_string(),
            }),
        };
        reporter
            .fixture(&fixture("seq.avm", InvocationMode::File), &verdict)
            .unwrap();
        let out = text(reporter);
        assert!(out.contains("-2"));
        assert!(out.contains("+3"));
        assert!(out.contains(" 1"));
    }

    #[test]
    fn summary_tallies_and_lists_failures() {
        let mut summary = RunSummary::default();
        summary.record("a.avm", &Verdict::Pass);
        summary.record("b.avm", &Verdict::fail("nope"));
        summary.record("c.avm (stdin)", &Verdict::Pass);
        assert_eq!(summary.passed(), 2);

        let mut reporter = Reporter::new(Buffer::no_color());
        reporter.summary(&summary).unwrap();
        assert_eq!(
            text(reporter),
            "\nSummary: 2/3 passed\n\nFailed tests:\n  - b.avm\n"
        );
    }

    #[test]
    fn clean_summary_has_no_failed_list() {
        let mut summary = RunSummary::default();
        summary.record("a.avm", &Verdict::Pass);
        let mut reporter = Reporter::new(Buffer::no_color());
        reporter.summary(&summary).unwrap();
        assert_eq!(text(reporter), "\nSummary: 1/1 passed\n");
    }
}
