//! Heuristic classification of output lines.
//!
//! Matching runs on the text with SGR sequences removed and ignores case.
//! Patterns are plain substrings, so `errors`, `terror` and `undone` all
//! match; these are display hints, not parsers.

use crate::ansi::strip_ansi;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

static ERROR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)error|exception|fail(?:ed|ure)?|✗|fatal|critical")
        .expect("error regex is valid")
});

static SUCCESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)success|complete(?:d)?|✓|done|passed").expect("success regex is valid")
});

static WARNING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)warn(?:ing)?|deprecated|⚠|caution").expect("warning regex is valid")
});

/// Heuristic category of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Reports success; shown green.
    Success,
    /// Reports a warning; shown yellow.
    Warning,
    /// Reports an error; shown red.
    Error,
    /// Nothing recognized; left as-is.
    Plain,
}

impl LineKind {
    /// SGR foreground code used to highlight this kind.
    pub fn sgr_code(self) -> Option<u8> {
        match self {
            Self::Success => Some(32),
            Self::Warning => Some(33),
            Self::Error => Some(31),
            Self::Plain => None,
        }
    }
}

/// Whether the line looks like an error.
pub fn is_error_line(text: &str) -> bool {
    ERROR_PATTERN.is_match(&strip_ansi(text))
}

/// Whether the line looks like a success message.
pub fn is_success_line(text: &str) -> bool {
    SUCCESS_PATTERN.is_match(&strip_ansi(text))
}

/// Whether the line looks like a warning.
pub fn is_warning_line(text: &str) -> bool {
    WARNING_PATTERN.is_match(&strip_ansi(text))
}

/// Classify with fixed precedence: success, then warning, then error.
pub fn classify(text: &str) -> LineKind {
    let stripped = strip_ansi(text);
    if SUCCESS_PATTERN.is_match(&stripped) {
        LineKind::Success
    } else if WARNING_PATTERN.is_match(&stripped) {
        LineKind::Warning
    } else if ERROR_PATTERN.is_match(&stripped) {
        LineKind::Error
    } else {
        LineKind::Plain
    }
}

/// Wrap an unstyled line in the color of its [`LineKind`].
///
/// Lines that already contain an escape character are returned as-is,
/// which makes the function idempotent. Plain lines are returned as-is too.
pub fn auto_colorize(line: &str) -> Cow<'_, str> {
    if line.contains('\x1b') {
        return Cow::Borrowed(line);
    }
    match classify(line).sgr_code() {
        Some(code) => Cow::Owned(format!("\x1b[{code}m{line}\x1b[0m")),
        None => Cow::Borrowed(line),
    }
}
