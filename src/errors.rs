//! Harness error handling.
//!
//! Only conditions that stop the whole run live here. Anything local to a
//! single fixture (missing companion, unreadable expectation, subject
//! mismatch) is a failing [`Verdict`](crate::checker::Verdict) instead, so
//! the remaining fixtures still execute.

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

/// Process exit code used when the harness itself cannot run.
pub const EXIT_HARNESS_ERROR: i32 = 2;

pub type SourceArc = Arc<NamedSource<String>>;

/// Every way the harness can refuse to run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Binary not found: {}", path.display())]
    SubjectMissing { path: PathBuf },

    #[error("No tests found.")]
    NoFixtures { root: PathBuf },

    #[error("No tests matched filter '{filter}'")]
    NoFixturesMatched { filter: String, discovered: usize },

    #[error("Failed to walk fixture directory {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {message}", path.display())]
    ConfigParse {
        path: PathBuf,
        message: String,
        src: SourceArc,
        offset: Option<usize>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    /// Builds a [`HarnessError::ConfigParse`] that points at the offending YAML location.
    pub fn config_parse(path: impl Into<PathBuf>, content: &str, err: &serde_yaml::Error) -> Self {
        let path = path.into();
        let src = Arc::new(NamedSource::new(
            path.display().to_string(),
            content.to_string(),
        ));
        HarnessError::ConfigParse {
            message: err.to_string(),
            offset: err.location().map(|loc| loc.index()),
            src,
            path,
        }
    }

    pub fn exit_code(&self) -> i32 {
        EXIT_HARNESS_ERROR
    }

    fn code_str(&self) -> &'static str {
        match self {
            HarnessError::SubjectMissing { .. } => "avm_conformance::subject_missing",
            HarnessError::NoFixtures { .. } => "avm_conformance::no_fixtures",
            HarnessError::NoFixturesMatched { .. } => "avm_conformance::no_fixtures_matched",
            HarnessError::Walk { .. } => "avm_conformance::walk",
            HarnessError::ConfigRead { .. } => "avm_conformance::config_read",
            HarnessError::ConfigParse { .. } => "avm_conformance::config_parse",
            HarnessError::Io { .. } => "avm_conformance::io",
        }
    }

    fn help_text(&self) -> Option<String> {
        match self {
            HarnessError::SubjectMissing { .. } => Some(
                "build the interpreter first, or point --subject at an existing binary".to_string(),
            ),
            HarnessError::NoFixtures { root } => Some(format!(
                "expected at least one fixture file under {}",
                root.display()
            )),
            HarnessError::NoFixturesMatched { discovered, .. } => Some(format!(
                "{} fixture(s) were discovered but none matched",
                discovered
            )),
            _ => None,
        }
    }
}

impl Diagnostic for HarnessError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_text()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            HarnessError::ConfigParse { src, .. } => Some(src.as_ref() as &dyn SourceCode),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let HarnessError::ConfigParse {
            offset: Some(offset),
            src,
            ..
        } = self
        else {
            return None;
        };
        let len = usize::from(*offset < src.inner().len());
        let label = LabeledSpan::new(Some("here".to_string()), *offset, len);
        Some(Box::new(std::iter::once(label)))
    }
}
