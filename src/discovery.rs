use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::HarnessConfig;
use crate::errors::HarnessError;

// =====================
// Fixture Model
// =====================

/// How the subject receives a fixture's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationMode {
    /// Fixture path passed as the single command-line argument.
    File,
    /// Fixture text piped to stdin, terminated by the sentinel line.
    Stdin,
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationMode::File => write!(f, "file"),
            InvocationMode::Stdin => write!(f, "stdin"),
        }
    }
}

/// What a fixture expects of the subject, fixed at discovery time from its companions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseKind {
    /// `.out` present: exit 0 with exactly this stdout. A `.err` alongside adds a stderr check.
    Accept {
        expected_out: PathBuf,
        expected_err: Option<PathBuf>,
    },
    /// Only `.err` present: non-zero exit with stderr containing its trimmed text.
    Reject { expected_err: PathBuf },
    /// No companion at all.
    Invalid,
}

impl CaseKind {
    /// Classifies a fixture from the companions that exist on disk.
    ///
    /// The expected-output companion always wins when both are present.
    pub fn locate(fixture: &Path, out_ext: &str, err_ext: &str) -> Self {
        let out = fixture.with_extension(out_ext);
        let err = fixture.with_extension(err_ext);
        let err = err.is_file().then_some(err);
        if out.is_file() {
            return CaseKind::Accept {
                expected_out: out,
                expected_err: err,
            };
        }
        match err {
            Some(expected_err) => CaseKind::Reject { expected_err },
            None => CaseKind::Invalid,
        }
    }
}

/// One discovered test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub path: PathBuf,
    /// `path` relative to the fixture root, used for reporting and filtering.
    pub relative: PathBuf,
    pub mode: InvocationMode,
    pub case: CaseKind,
}

impl Fixture {
    /// The label printed in the report: relative path, plus ` (stdin)` for piped fixtures.
    pub fn label(&self) -> String {
        match self.mode {
            InvocationMode::File => self.relative.display().to_string(),
            InvocationMode::Stdin => format!("{} (stdin)", self.relative.display()),
        }
    }
}

/// The two disjoint, path-sorted fixture sequences.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    pub file_mode: Vec<Fixture>,
    pub stdin_mode: Vec<Fixture>,
}

impl FixtureSet {
    pub fn len(&self) -> usize {
        self.file_mode.len() + self.stdin_mode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// File-mode fixtures first, then stdin-mode, each in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Fixture> {
        self.file_mode.iter().chain(self.stdin_mode.iter())
    }

    /// Keeps fixtures whose relative path contains `filter`, ignoring case.
    pub fn retain_matching(&mut self, filter: &str) {
        let needle = filter.to_lowercase();
        let keep = |f: &Fixture| {
            f.relative
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle)
        };
        self.file_mode.retain(keep);
        self.stdin_mode.retain(keep);
    }
}

// =====================
// Discovery
// =====================

/// Finds fixtures under a root directory.
#[derive(Debug)]
pub struct FixtureDiscoverer<'a> {
    config: &'a HarnessConfig,
}

impl<'a> FixtureDiscoverer<'a> {
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self { config }
    }

    // =====================
    // Public API - Fixture Discovery
    // =====================

    /// Walks the root and returns both sequences, each sorted by path.
    pub fn discover(&self) -> Result<FixtureSet, HarnessError> {
        let set = FixtureSet {
            file_mode: self.collect_file_mode()?,
            stdin_mode: self.collect_stdin_mode()?,
        };
        tracing::debug!(
            file_mode = set.file_mode.len(),
            stdin_mode = set.stdin_mode.len(),
            root = %self.config.fixture_root.display(),
            "discovered fixtures"
        );
        Ok(set)
    }

    /// Every fixture under the root except the stdin subtree.
    pub fn collect_file_mode(&self) -> Result<Vec<Fixture>, HarnessError> {
        let stdin_root = self.config.stdin_root();
        let paths = self.walk(&self.config.fixture_root, Some(&stdin_root))?;
        Ok(self.build_fixtures(paths, InvocationMode::File))
    }

    /// Every fixture under the stdin subtree; empty if the subtree does not exist.
    pub fn collect_stdin_mode(&self) -> Result<Vec<Fixture>, HarnessError> {
        let stdin_root = self.config.stdin_root();
        if !stdin_root.is_dir() {
            return Ok(Vec::new());
        }
        let paths = self.walk(&stdin_root, None)?;
        Ok(self.build_fixtures(paths, InvocationMode::Stdin))
    }

    // =====================
    // Internal - File System Utilities
    // =====================

    fn walk(&self, root: &Path, prune: Option<&Path>) -> Result<Vec<PathBuf>, HarnessError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| match prune {
                Some(pruned) => entry.depth() == 0 || entry.path() != pruned,
                None => true,
            });
        for entry in walker {
            let entry = entry.map_err(|source| HarnessError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            // `file_type` describes a symlink itself; `is_file` follows it.
            if !path.is_file() {
                continue;
            }
            if !self.is_fixture_file(path) {
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    fn build_fixtures(&self, paths: Vec<PathBuf>, mode: InvocationMode) -> Vec<Fixture> {
        paths
            .into_iter()
            .map(|path| {
                let case = CaseKind::locate(
                    &path,
                    &self.config.expected_out_ext,
                    &self.config.expected_err_ext,
                );
                let relative = path
                    .strip_prefix(&self.config.fixture_root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| path.clone());
                Fixture {
                    path,
                    relative,
                    mode,
                    case,
                }
            })
            .collect()
    }

    fn is_fixture_file(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.config.fixture_ext.as_str())
    }
}
