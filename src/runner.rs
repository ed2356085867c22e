//! Runs the subject interpreter against one fixture and captures what it did.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use crate::discovery::{Fixture, InvocationMode};
use crate::normalize::ensure_stdin_terminator_bytes;

/// Exit code reported when the subject could not be launched or did not exit normally.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Captured observable behaviour of one subject run, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ExecutionResult {
    /// A run that never happened, described on stderr so the checker can report it.
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: message.into().into_bytes(),
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout for display; invalid UTF-8 is replaced.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Stderr for display and needle matching; invalid UTF-8 is replaced.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Spawns the subject binary, one blocking child process per call.
#[derive(Debug, Clone)]
pub struct SubjectRunner {
    subject: PathBuf,
}

impl SubjectRunner {
    /// A bare program name is taken relative to the working directory, never looked up on `PATH`.
    pub fn new(subject: impl Into<PathBuf>) -> Self {
        Self {
            subject: anchor_bare_name(subject.into()),
        }
    }

    pub fn subject(&self) -> &Path {
        &self.subject
    }

    /// Runs `fixture` in the mode it was discovered with.
    ///
    /// Fails only when a stdin-mode fixture cannot be read; the subject is
    /// not started in that case.
    pub fn run(&self, fixture: &Fixture) -> io::Result<ExecutionResult> {
        match fixture.mode {
            InvocationMode::File => Ok(self.run_file_mode(&fixture.path)),
            InvocationMode::Stdin => self.run_stdin_mode(&fixture.path),
        }
    }

    /// `subject <fixture>` with no stdin.
    pub fn run_file_mode(&self, fixture: &Path) -> ExecutionResult {
        tracing::debug!(subject = %self.subject.display(), fixture = %fixture.display(), "running in file mode");
        let mut cmd = Command::new(&self.subject);
        cmd.arg(fixture).stdin(Stdio::null());
        self.capture(cmd, None)
    }

    /// `subject` with the fixture bytes, sentinel-terminated, piped to stdin.
    pub fn run_stdin_mode(&self, fixture: &Path) -> io::Result<ExecutionResult> {
        tracing::debug!(subject = %self.subject.display(), fixture = %fixture.display(), "running in stdin mode");
        let source = fs::read(fixture)?;
        Ok(self.run_with_stdin(&ensure_stdin_terminator_bytes(&source)))
    }

    /// `subject` with `input` piped verbatim to stdin, which is then closed.
    pub fn run_with_stdin(&self, input: &[u8]) -> ExecutionResult {
        let mut cmd = Command::new(&self.subject);
        cmd.stdin(Stdio::piped());
        self.capture(cmd, Some(input.to_vec()))
    }

    fn capture(&self, mut cmd: Command, input: Option<Vec<u8>>) -> ExecutionResult {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        match spawn_and_wait(cmd, input) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(subject = %self.subject.display(), error = %e, "failed to launch subject");
                ExecutionResult::launch_failure(format!(
                    "failed to launch {}: {}",
                    self.subject.display(),
                    e
                ))
            }
        }
    }
}

fn anchor_bare_name(subject: PathBuf) -> PathBuf {
    let mut components = subject.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Path::new(".").join(subject),
        _ => subject,
    }
}

fn spawn_and_wait(mut cmd: Command, input: Option<Vec<u8>>) -> io::Result<ExecutionResult> {
    let mut child = cmd.spawn()?;

    // Feed stdin from its own thread so a chatty subject cannot fill the
    // stdout pipe while we are still blocked writing its input.
    let feeder = match (child.stdin.take(), input) {
        (Some(mut stdin), Some(input)) => Some(thread::spawn(move || -> io::Result<()> {
            stdin.write_all(&input)?;
            stdin.flush()
        })),
        _ => None,
    };

    let output = child.wait_with_output()?;

    if let Some(feeder) = feeder {
        match feeder.join() {
            Ok(Ok(())) => {}
            // The subject may stop reading at the sentinel and exit early.
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed writing subject stdin"),
            Err(_) => tracing::warn!("stdin feeder thread panicked"),
        }
    }

    Ok(ExecutionResult {
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code: exit_code_of(output.status),
    })
}

/// The process exit code, or the negated signal number on Unix.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    LAUNCH_FAILURE_EXIT_CODE
}
