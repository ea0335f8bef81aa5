//! Line-oriented text sources.
//!
//! Later stages are source-agnostic: they pull lines from a [`TextReader`]
//! whether the script came from a file or an in-memory string. Line
//! terminators (`\n`, `\r\n`, lone `\r`) are consumed and stripped.

use std::io::{self, Read};

/// A source of script text, one line at a time.
pub trait TextReader {
    /// Read the next line into `line`, replacing its contents.
    ///
    /// Returns `false` once the source is exhausted. The line terminator is
    /// not included.
    fn read_line(&mut self, line: &mut String) -> bool;
}

/// Reads lines from a borrowed string.
pub struct StringReader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> StringReader<'a> {
    /// Create a reader over `text`.
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl TextReader for StringReader<'_> {
    fn read_line(&mut self, line: &mut String) -> bool {
        line.clear();

        let bytes = self.text.as_bytes();
        if self.pos >= bytes.len() {
            return false;
        }

        let start = self.pos;
        let mut end = self.pos;
        while end < bytes.len() && bytes[end] != b'\n' && bytes[end] != b'\r' {
            end += 1;
        }

        line.push_str(&self.text[start..end]);

        // Consume the terminator, treating "\r\n" as one.
        if end < bytes.len() {
            if bytes[end] == b'\r' && end + 1 < bytes.len() && bytes[end + 1] == b'\n' {
                end += 2;
            } else {
                end += 1;
            }
        }
        self.pos = end;
        true
    }
}

/// Reads lines from any byte stream, slurped up front.
///
/// Scripts are small; buffering the whole input keeps the line-splitting
/// logic in one place. Input is decoded as UTF-8 with invalid sequences
/// replaced, which also accepts the Latin-1 files found in the wild.
pub struct StreamReader {
    text: String,
    pos: usize,
}

impl StreamReader {
    /// Read all of `source` and prepare to iterate its lines.
    pub fn new<R: Read>(mut source: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self { text, pos: 0 })
    }
}

impl TextReader for StreamReader {
    fn read_line(&mut self, line: &mut String) -> bool {
        let mut inner = StringReader {
            text: &self.text,
            pos: self.pos,
        };
        let more = inner.read_line(line);
        self.pos = inner.pos;
        more
    }
}

/// Collect every remaining line of `reader`, newline-terminated.
pub fn read_to_string(reader: &mut dyn TextReader) -> String {
    let mut out = String::new();
    let mut line = String::with_capacity(256);
    while reader.read_line(&mut line) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}
