//! Reassembly of raw output chunks into lines.

/// Default cap on one line before it is force-split.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Smallest cap that still fits any UTF-8 scalar.
const MIN_LINE_BYTES: usize = 4;

/// Turns a byte stream, delivered in arbitrary chunks, into text lines.
///
/// Chunks may split lines and multi-byte characters anywhere. Complete
/// lines are decoded lossily, so invalid UTF-8 becomes U+FFFD instead of
/// an error. A line that grows past the cap is emitted in pieces cut on
/// character boundaries.
#[derive(Debug)]
pub struct LineAssembler {
    buf: Vec<u8>,
    max_line_bytes: usize,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Assembler with [`DEFAULT_MAX_LINE_BYTES`].
    pub fn new() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }

    /// Assembler with a custom line cap (at least 4 bytes).
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_bytes: max_line_bytes.max(MIN_LINE_BYTES),
        }
    }

    /// Bytes held for the current incomplete line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Feed a chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            lines.push(decode_line(&self.buf[start..end]));
            start = end + 1;
        }
        self.buf.drain(..start);

        while self.buf.len() > self.max_line_bytes {
            let cut = char_boundary_before(&self.buf, self.max_line_bytes);
            lines.push(String::from_utf8_lossy(&self.buf[..cut]).into_owned());
            self.buf.drain(..cut);
        }

        lines
    }

    /// Flush the trailing partial line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(decode_line(&rest))
    }
}

/// Decode one line, dropping the `\r` of a CRLF ending.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Largest cut `<= limit` that does not land inside a UTF-8 sequence.
fn char_boundary_before(buf: &[u8], limit: usize) -> usize {
    let mut cut = limit;
    // continuation bytes are 0b10xx_xxxx
    while cut > 0 && (buf[cut] & 0xC0) == 0x80 {
        cut -= 1;
    }
    if cut == 0 {
        limit
    } else {
        cut
    }
}
