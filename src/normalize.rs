//! Stdin terminator normalization.
//!
//! The subject reads a program from standard input until it sees a line
//! consisting solely of [`SENTINEL`]. Fixture authors may or may not write
//! that line themselves; [`ensure_stdin_terminator`] makes sure the stream
//! handed to the subject is always terminated.

/// The end-of-program line the subject waits for on stdin.
pub const SENTINEL: &str = ";;";

/// Canonicalizes line endings and guarantees a terminating sentinel line.
///
/// If any line already equals the sentinel once surrounding whitespace is
/// stripped, the text is returned as-is apart from line endings and a
/// trailing newline. Otherwise `;;\n` is appended after a newline.
pub fn ensure_stdin_terminator(src: &str) -> String {
    // Only ASCII bytes are rewritten or inserted, so valid UTF-8 stays valid.
    String::from_utf8_lossy(&ensure_stdin_terminator_bytes(src.as_bytes())).into_owned()
}

/// [`ensure_stdin_terminator`] over raw fixture bytes, which need not be UTF-8.
pub fn ensure_stdin_terminator_bytes(src: &[u8]) -> Vec<u8> {
    let mut text = canonicalize_line_endings(src);
    let terminated = has_sentinel_line(&text);
    if !text.ends_with(b"\n") {
        text.push(b'\n');
    }
    if !terminated {
        text.extend_from_slice(SENTINEL.as_bytes());
        text.push(b'\n');
    }
    text
}

/// Rewrites CRLF and bare CR line endings to LF.
pub fn canonicalize_line_endings(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut bytes = src.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if byte == b'\r' {
            bytes.next_if_eq(&b'\n');
            out.push(b'\n');
        } else {
            out.push(byte);
        }
    }
    out
}

/// Returns true if some line of `text` is the sentinel, ignoring surrounding whitespace.
pub fn has_sentinel_line(text: &[u8]) -> bool {
    text.split(|&b| b == b'\n')
        .any(|line| String::from_utf8_lossy(line).trim() == SENTINEL)
}
