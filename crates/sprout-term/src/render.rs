//! Per-line rendering for the terminal view.

use crate::ansi::{decode, StyledSegment};
use crate::classify::{auto_colorize, classify, LineKind};
use serde::{Deserialize, Serialize};

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// One raw output line and its stream tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    /// Source stream.
    pub stream: Stream,
    /// Raw text, escapes included, without the line terminator.
    pub text: String,
}

impl TerminalLine {
    /// Line from standard output.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stdout,
            text: text.into(),
        }
    }

    /// Line from standard error.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stderr,
            text: text.into(),
        }
    }
}

/// A line ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    /// Source stream.
    pub stream: Stream,
    /// Heuristic category.
    pub kind: LineKind,
    /// Styled segments; never empty.
    pub segments: Vec<StyledSegment>,
}

/// Classify and decode one line.
///
/// Unstyled lines pick up their heuristic color; lines that already carry
/// escapes keep their own styling.
pub fn render(line: &TerminalLine) -> RenderedLine {
    RenderedLine {
        stream: line.stream,
        kind: classify(&line.text),
        segments: decode(&auto_colorize(&line.text)).segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_plain_line() {
        let rendered = render(&TerminalLine::stdout("listening on :3000"));
        assert_eq!(rendered.kind, LineKind::Plain);
        assert_eq!(rendered.segments, vec![StyledSegment::plain("listening on :3000")]);
    }

    #[test]
    fn test_unstyled_error_gets_red() {
        let rendered = render(&TerminalLine::stderr("Error: boom"));
        assert_eq!(rendered.stream, Stream::Stderr);
        assert_eq!(rendered.kind, LineKind::Error);
        assert_eq!(rendered.segments.len(), 1);
        assert_eq!(rendered.segments[0].text, "Error: boom");
        assert_eq!(rendered.segments[0].style.color, Some(Color::Red));
    }

    #[test]
    fn test_styled_line_keeps_own_colors() {
        let rendered = render(&TerminalLine::stdout("\x1b[36mError\x1b[0m handled"));
        assert_eq!(rendered.kind, LineKind::Error);
        assert_eq!(rendered.segments[0].style.color, Some(Color::Cyan));
        assert!(rendered.segments[1].style.is_plain());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(render(&TerminalLine::stdout("Done"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "stream": "stdout",
                "kind": "success",
                "segments": [{ "text": "Done", "color": "#0DBC79" }]
            })
        );
    }
}
