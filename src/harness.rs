//! The orchestrator: discovery, execution, checking, reporting.
//!
//! ```rust,no_run
//! use avm_conformance::{Harness, HarnessConfig};
//!
//! let config = HarnessConfig::for_root("tests");
//! let outcome = Harness::new(config).run_to_stdout();
//! std::process::exit(outcome.exit_code());
//! ```

use std::io;

use termcolor::WriteColor;

use crate::checker::{self, Verdict};
use crate::config::HarnessConfig;
use crate::discovery::{Fixture, FixtureDiscoverer, FixtureSet};
use crate::errors::HarnessError;
use crate::report::{Reporter, RunSummary};
use crate::runner::SubjectRunner;

pub const EXIT_ALL_PASSED: i32 = 0;
pub const EXIT_FAILURES: i32 = 1;

// =====================
// Run Outcome
// =====================

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every fixture ran; `summary` says how many failed.
    Completed(RunSummary),
    /// The harness could not run at all.
    Aborted(HarnessError),
}

impl RunOutcome {
    /// `0` all passed, `1` some failed, `2` harness error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(summary) if summary.has_failures() => EXIT_FAILURES,
            RunOutcome::Completed(_) => EXIT_ALL_PASSED,
            RunOutcome::Aborted(err) => err.exit_code(),
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::Completed(summary) => Some(summary),
            RunOutcome::Aborted(_) => None,
        }
    }
}

// =====================
// Orchestration
// =====================

/// Runs every discovered fixture against the subject, one at a time.
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
    runner: SubjectRunner,
}

impl Harness {
    pub fn new(mut config: HarnessConfig) -> Self {
        let runner = SubjectRunner::new(config.subject.clone());
        config.subject = runner.subject().to_path_buf();
        Self { config, runner }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    // =====================
    // Public API - Running
    // =====================

    /// Runs with the report on stdout, coloured per the config.
    pub fn run_to_stdout(&self) -> RunOutcome {
        let mut reporter = Reporter::stdout(self.config.color);
        self.run(&mut reporter)
    }

    /// Runs the whole suite, writing the report through `reporter`.
    ///
    /// Harness errors abort before any fixture runs; report write failures
    /// abort as [`HarnessError::Io`] on stdout.
    pub fn run<W: WriteColor>(&self, reporter: &mut Reporter<W>) -> RunOutcome {
        let fixtures = match self.prepare() {
            Ok(fixtures) => fixtures,
            Err(err) => return RunOutcome::Aborted(err),
        };
        match self.execute(&fixtures, reporter) {
            Ok(summary) => RunOutcome::Completed(summary),
            Err(source) => RunOutcome::Aborted(HarnessError::Io {
                path: "<stdout>".into(),
                source,
            }),
        }
    }

    /// Checks the subject exists, then discovers and filters fixtures.
    pub fn prepare(&self) -> Result<FixtureSet, HarnessError> {
        if !self.config.subject.exists() {
            return Err(HarnessError::SubjectMissing {
                path: self.config.subject.clone(),
            });
        }

        let mut fixtures = FixtureDiscoverer::new(&self.config).discover()?;
        if fixtures.is_empty() {
            return Err(HarnessError::NoFixtures {
                root: self.config.fixture_root.clone(),
            });
        }

        if let Some(filter) = &self.config.filter {
            let discovered = fixtures.len();
            fixtures.retain_matching(filter);
            if fixtures.is_empty() {
                return Err(HarnessError::NoFixturesMatched {
                    filter: filter.clone(),
                    discovered,
                });
            }
        }
        Ok(fixtures)
    }

    /// Runs and checks one fixture. A fixture that cannot be read fails without running.
    pub fn run_fixture(&self, fixture: &Fixture) -> Verdict {
        let result = match self.runner.run(fixture) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(fixture = %fixture.path.display(), error = %e, "cannot read fixture");
                return Verdict::fail(format!(
                    "Cannot read fixture {}: {}",
                    fixture.path.display(),
                    e
                ));
            }
        };
        tracing::debug!(
            fixture = %fixture.relative.display(),
            mode = %fixture.mode,
            exit_code = result.exit_code,
            "subject finished"
        );
        checker::check(fixture, &result)
    }

    // =====================
    // Internal - Execution Loop
    // =====================

    fn execute<W: WriteColor>(
        &self,
        fixtures: &FixtureSet,
        reporter: &mut Reporter<W>,
    ) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();
        for fixture in fixtures.iter() {
            let verdict = self.run_fixture(fixture);
            reporter.fixture(fixture, &verdict)?;
            summary.record(&fixture.label(), &verdict);
        }
        reporter.summary(&summary)?;
        Ok(summary)
    }
}
