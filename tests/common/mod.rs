#![allow(dead_code)]

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A tiny stack machine standing in for `abstract_vm`.
///
/// With an argument it runs that file; without one it reads stdin and
/// refuses input that never reaches the `;;` line.
const INTERPRETER: &str = r#"
piped && $0 == ";;" { terminated = 1; exit 0 }
$1 == "push"  { stack[++n] = $2; next }
$1 == "add"   { b = stack[n--]; a = stack[n--]; stack[++n] = a + b; next }
$1 == "div"   {
    b = stack[n--]; a = stack[n--]
    if (b == 0) { print "Error: division by zero" > "/dev/stderr"; failed = 1; exit 1 }
    stack[++n] = int(a / b); next
}
$1 == "print" { print stack[n]; next }
$1 == "" || $1 == "exit" { next }
{ print "Error: unknown instruction " $1 > "/dev/stderr"; failed = 1; exit 1 }
END {
    if (failed) exit 1
    if (piped && !terminated) { print "Error: missing ;; terminator" > "/dev/stderr"; exit 1 }
}
"#;

pub struct FakeSubject {
    temp_dir: TempDir,
    bin_path: PathBuf,
}

impl FakeSubject {
    /// The stack-machine interpreter.
    pub fn interpreter() -> io::Result<Self> {
        let script = format!(
            "#!/bin/sh\nprog='{}'\nif [ \"$#\" -gt 0 ]; then\n  exec awk -v piped=0 \"$prog\" \"$1\"\nfi\nexec awk -v piped=1 \"$prog\"\n",
            INTERPRETER
        );
        Self::new_script(&script)
    }

    /// Prints fixed streams and exits with a fixed code, whatever the input.
    pub fn fixed(stdout: &str, stderr: &str, exit_code: i32) -> io::Result<Self> {
        let script = format!(
            "#!/bin/sh\ncat >/dev/null 2>&1\nprintf '%s' '{}'\nprintf '%s' '{}' >&2\nexit {}\n",
            quote(stdout),
            quote(stderr),
            exit_code
        );
        Self::new_script(&script)
    }

    pub fn new_script(script: &str) -> io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let bin_path = temp_dir.path().join("abstract_vm");
        fs::write(&bin_path, script)?;
        let mut perms = fs::metadata(&bin_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&bin_path, perms)?;
        Ok(Self { temp_dir, bin_path })
    }

    /// Echoes its stdin back on stdout.
    pub fn echo() -> io::Result<Self> {
        Self::new_script("#!/bin/sh\ncat\n")
    }

    pub fn path(&self) -> &Path {
        &self.bin_path
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// A throwaway fixture root.
pub struct FixtureTree {
    temp_dir: TempDir,
}

impl FixtureTree {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        self.write_bytes(rel, content.as_bytes())
    }

    pub fn write_bytes(&self, rel: &str, content: &[u8]) -> &Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().expect("fixture path has a parent"))
            .expect("create fixture dir");
        fs::write(path, content).expect("write fixture");
        self
    }
}

fn quote(text: &str) -> String {
    text.replace('\'', "'\\''")
}
