//! # sprout-term
//!
//! Turns raw sandbox output into styled, classified lines for the
//! terminal view.
//!
//! - [`LineAssembler`] cuts a chunked byte stream into lines.
//! - [`decode`] splits one line into [`StyledSegment`]s by interpreting
//!   ANSI SGR sequences; [`strip_ansi`] removes them.
//! - [`classify`] and the `is_*_line` helpers guess whether a line reports
//!   success, a warning, or an error; [`auto_colorize`] adds matching color
//!   to lines that have none.
//! - [`render`] combines both for one [`TerminalLine`].
//!
//! Everything here is a pure function of its input. Nothing is shared
//! between calls, so lines can be rendered from any number of threads.
//!
//! ```
//! use sprout_term::{decode, strip_ansi, Color};
//!
//! let line = "\x1b[1;32mPASS\x1b[0m src/App.test.tsx";
//! let decoded = decode(line);
//!
//! assert_eq!(decoded.segments[0].text, "PASS");
//! assert_eq!(decoded.segments[0].style.color, Some(Color::Green));
//! assert!(decoded.segments[0].style.bold);
//! assert_eq!(decoded.text(), strip_ansi(line));
//! ```

mod ansi;
mod classify;
mod render;
mod stream;
mod style;

pub use ansi::{decode, has_sgr, strip_ansi, DecodedLine, StyledSegment};
pub use classify::{
    auto_colorize, classify, is_error_line, is_success_line, is_warning_line, LineKind,
};
pub use render::{render, RenderedLine, Stream, TerminalLine};
pub use stream::{LineAssembler, DEFAULT_MAX_LINE_BYTES};
pub use style::{sgr_effect, Color, SgrEffect, Style};
