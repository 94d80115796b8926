//! Decoding of ANSI SGR escape sequences into styled segments.
//!
//! Only `ESC [ <digits>(;<digits>)* m` is recognized. Anything else,
//! including an `ESC [` that never reaches its `m`, stays in the text as
//! literal characters. Style never carries over between lines: each call
//! to [`decode`] starts from [`Style::default`].

use crate::style::{sgr_effect, Style};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Matches one complete CSI-SGR sequence.
static SGR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("SGR regex is valid"));

/// A contiguous run of characters sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledSegment {
    /// Visible text.
    pub text: String,
    /// Style of the text.
    #[serde(flatten)]
    pub style: Style,
}

impl StyledSegment {
    /// Segment with no style.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
        }
    }
}

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedLine {
    /// Segments in display order; never empty.
    pub segments: Vec<StyledSegment>,
}

impl DecodedLine {
    /// Visible text of the whole line.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Split `line` into styled segments.
///
/// A segment ends exactly where an escape changes the style, and carries
/// the style in effect before that escape. Unknown and non-numeric
/// parameters are skipped. A line without visible text (empty, or made of
/// escapes only) yields a single plain segment with empty text, so the
/// concatenated segment text always equals [`strip_ansi`] of the input.
/// The escapes of such a line are dropped, not echoed back as text; keep
/// the raw line alongside if it must be shown verbatim.
pub fn decode(line: &str) -> DecodedLine {
    let mut style = Style::default();
    let mut segments = Vec::new();
    let mut cursor = 0;

    for sgr in SGR_PATTERN.find_iter(line) {
        push_segment(&mut segments, &line[cursor..sgr.start()], style);

        // Strip the `ESC [` prefix and `m` suffix.
        let params = &line[sgr.start() + 2..sgr.end() - 1];
        for param in params.split(';') {
            if let Some(effect) = param.parse::<u32>().ok().and_then(sgr_effect) {
                style.apply(effect);
            }
        }
        cursor = sgr.end();
    }
    push_segment(&mut segments, &line[cursor..], style);

    if segments.is_empty() {
        segments.push(StyledSegment::plain(String::new()));
    }
    DecodedLine { segments }
}

fn push_segment(segments: &mut Vec<StyledSegment>, text: &str, style: Style) {
    if !text.is_empty() {
        segments.push(StyledSegment {
            text: text.to_string(),
            style,
        });
    }
}

/// Remove every CSI-SGR sequence from `line`.
pub fn strip_ansi(line: &str) -> String {
    SGR_PATTERN.replace_all(line, "").into_owned()
}

/// Whether `line` contains at least one CSI-SGR sequence.
pub fn has_sgr(line: &str) -> bool {
    SGR_PATTERN.is_match(line)
}
