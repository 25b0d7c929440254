//! Line and column tracking over consumed input.

use std::fmt;

use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: u32 = 8;

/// A line/column position in the input text.
///
/// Columns are counted in display cells, so wide characters advance the
/// column by two and tabs by eight.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    line: u32,
    col: u32,
}

impl Default for Location {
    fn default() -> Self {
        Location::new()
    }
}

impl Location {
    /// The location of the first character of a stream.
    pub fn new() -> Self {
        Location { line: 1, col: 1 }
    }

    /// The line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The column number.
    pub fn col(&self) -> u32 {
        self.col
    }

    fn newline(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    /// Advance the location over `bytes`.
    ///
    /// A `\r` on its own does not move the location, so `\r\n` counts as a
    /// single newline even when the pair is split across two calls.
    pub(crate) fn advance(&mut self, bytes: &[u8]) {
        for c in String::from_utf8_lossy(bytes).chars() {
            match c {
                '\n' => self.newline(),
                '\r' => {}
                '\t' => self.col += TAB_WIDTH,
                c => self.col += c.width().unwrap_or(0) as u32,
            }
        }
    }

    /// The location reached after advancing a copy of `self` over `bytes`.
    pub(crate) fn after(mut self, bytes: &[u8]) -> Self {
        self.advance(bytes);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
