//! Harness configuration.
//!
//! A [`HarnessConfig`] is built in three layers: built-in defaults, an
//! optional `conformance.yaml` in the fixture root, then command-line
//! overrides applied by the CLI. The resulting value is handed to
//! [`Harness::new`](crate::harness::Harness::new); nothing reads global state.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use termcolor::ColorChoice;

use crate::errors::HarnessError;

pub const DEFAULT_FIXTURE_ROOT: &str = "tests";
pub const DEFAULT_SUBJECT_NAME: &str = "abstract_vm";
pub const DEFAULT_STDIN_DIR: &str = "stdin";
pub const DEFAULT_FIXTURE_EXT: &str = "avm";
pub const DEFAULT_EXPECTED_OUT_EXT: &str = "out";
pub const DEFAULT_EXPECTED_ERR_EXT: &str = "err";
pub const CONFIG_FILE_NAME: &str = "conformance.yaml";

/// Everything the orchestrator needs to know about one run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory walked for fixtures; reported paths are relative to it.
    pub fixture_root: PathBuf,
    /// The interpreter binary under test.
    pub subject: PathBuf,
    /// Name of the subdirectory of `fixture_root` holding stdin-mode fixtures.
    pub stdin_dir: String,
    pub fixture_ext: String,
    pub expected_out_ext: String,
    pub expected_err_ext: String,
    /// Case-insensitive substring a fixture's relative path must contain.
    pub filter: Option<String>,
    pub color: ColorChoice,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::for_root(DEFAULT_FIXTURE_ROOT)
    }
}

impl HarnessConfig {
    /// Defaults for a given fixture root, with the subject next to the root's parent.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let fixture_root = root.into();
        let subject = default_subject_for(&fixture_root);
        Self {
            fixture_root,
            subject,
            stdin_dir: DEFAULT_STDIN_DIR.to_string(),
            fixture_ext: DEFAULT_FIXTURE_EXT.to_string(),
            expected_out_ext: DEFAULT_EXPECTED_OUT_EXT.to_string(),
            expected_err_ext: DEFAULT_EXPECTED_ERR_EXT.to_string(),
            filter: None,
            color: detect_color(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<PathBuf>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Absolute-or-relative path of the stdin-mode subtree.
    pub fn stdin_root(&self) -> PathBuf {
        self.fixture_root.join(&self.stdin_dir)
    }

    /// Applies a parsed config file on top of the current values.
    ///
    /// A relative `subject` is resolved against the fixture root.
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(subject) = file.subject {
            self.subject = if subject.is_relative() {
                self.fixture_root.join(subject)
            } else {
                subject
            };
        }
        if let Some(stdin_dir) = file.stdin_dir {
            self.stdin_dir = stdin_dir;
        }
        if let Some(ext) = file.fixture_ext {
            self.fixture_ext = trim_dot(ext);
        }
        if let Some(ext) = file.expected_out_ext {
            self.expected_out_ext = trim_dot(ext);
        }
        if let Some(ext) = file.expected_err_ext {
            self.expected_err_ext = trim_dot(ext);
        }
        if file.filter.is_some() {
            self.filter = file.filter;
        }
    }
}

/// On-disk shape of `conformance.yaml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub subject: Option<PathBuf>,
    pub stdin_dir: Option<String>,
    pub fixture_ext: Option<String>,
    pub expected_out_ext: Option<String>,
    pub expected_err_ext: Option<String>,
    pub filter: Option<String>,
}

impl ConfigFile {
    pub fn parse(path: &Path, content: &str) -> Result<Self, HarnessError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| HarnessError::config_parse(path, content, &e))
    }

    /// Loads an explicitly requested config file; a missing file is an error.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::parse(path, &content)
    }

    /// Loads `conformance.yaml` from the fixture root if it exists.
    pub fn load_default(fixture_root: &Path) -> Result<Option<Self>, HarnessError> {
        let path = fixture_root.join(CONFIG_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Self::parse(&path, &content).map(Some)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HarnessError::ConfigRead { path, source }),
        }
    }
}

/// The subject lives beside the fixture root: `tests/` next to `./abstract_vm`.
pub fn default_subject_for(fixture_root: &Path) -> PathBuf {
    let parent = match fixture_root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    parent.join(DEFAULT_SUBJECT_NAME)
}

fn detect_color() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn trim_dot(ext: String) -> String {
    ext.trim_start_matches('.').to_string()
}
