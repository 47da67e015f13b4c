use std::fmt;

/// A single element in the character stream. The stream holds already-decoded
/// text (the reader turns bytes into characters before a stream is built), so
/// an element is either a character or the end of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Character {
    /// Standard character
    Ch(char),
    /// Stream buffer is exhausted and the stream is closed
    StreamEnd,
}

use Character::*;

impl From<Character> for char {
    fn from(c: Character) -> Self {
        match c {
            Ch(c) => c,
            StreamEnd => 0x0000 as char,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ch(ch) => write!(f, "{ch}"),
            StreamEnd => write!(f, "StreamEnd"),
        }
    }
}

impl Character {
    /// Returns true when the character is CSS whitespace (space, tab, or a
    /// newline character)
    pub fn is_css_whitespace(&self) -> bool {
        matches!(self, Ch(' ' | '\t' | '\r' | '\n' | '\x0c'))
    }

    /// Returns true when the character is an ascii digit
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ch(c) if c.is_ascii_digit())
    }

    /// Returns true when the character is an ascii hex digit
    pub fn is_hex_digit(&self) -> bool {
        matches!(self, Ch(c) if c.is_ascii_hexdigit())
    }

    /// Returns true when the character is a newline (LF, CR, or FF)
    pub fn is_newline(&self) -> bool {
        matches!(self, Ch('\n' | '\r' | '\x0c'))
    }
}

/// Location of an element in the source text. Lines and columns are 1-based;
/// the offset is the absolute character index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Keeps track of the current location while characters are consumed. A CRLF
/// pair counts as a single newline; a lone CR or FF also starts a new line.
pub struct LocationHandler {
    cur_location: Location,
    last_was_cr: bool,
}

impl LocationHandler {
    #[must_use]
    pub fn new(start_location: Location) -> Self {
        Self {
            cur_location: start_location,
            last_was_cr: false,
        }
    }

    /// Returns the location of the next character that will be consumed
    #[must_use]
    pub fn cur_location(&self) -> Location {
        self.cur_location
    }

    /// Advances the location over the given character
    pub fn inc(&mut self, ch: Character) {
        let Ch(c) = ch else {
            return;
        };

        match c {
            '\r' => {
                self.cur_location.line += 1;
                self.cur_location.column = 1;
                self.last_was_cr = true;
            }
            '\n' => {
                if self.last_was_cr {
                    // second half of a CRLF pair; the line was already counted
                    self.last_was_cr = false;
                } else {
                    self.cur_location.line += 1;
                    self.cur_location.column = 1;
                }
            }
            '\x0c' => {
                self.cur_location.line += 1;
                self.cur_location.column = 1;
                self.last_was_cr = false;
            }
            _ => {
                self.cur_location.column += 1;
                self.last_was_cr = false;
            }
        }

        self.cur_location.offset += 1;
    }
}

/// Character stream over decoded text. Consumers read one character at a time
/// and may look ahead arbitrarily far; the buffer is kept in full so earlier
/// positions stay addressable.
pub struct ByteStream {
    buffer: Vec<char>,
    position: usize,
    closed: bool,
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStream {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            position: 0,
            closed: false,
        }
    }

    /// Appends the given text to the stream buffer
    pub fn read_from_str(&mut self, s: &str) {
        self.buffer.extend(s.chars());
    }

    /// Closes the stream. A closed stream returns `StreamEnd` once the buffer
    /// is exhausted.
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[must_use]
    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Returns true when the stream is closed and all characters are consumed
    #[must_use]
    pub fn eof(&self) -> bool {
        self.closed && self.position >= self.buffer.len()
    }

    /// Returns the current character without consuming it
    #[must_use]
    pub fn read(&self) -> Character {
        self.look_ahead(0)
    }

    /// Returns the current character and advances the stream
    pub fn next(&mut self) -> Character {
        let c = self.read();
        if self.position < self.buffer.len() {
            self.position += 1;
        }
        c
    }

    /// Returns the character at the given offset from the current position
    #[must_use]
    pub fn look_ahead(&self, offset: usize) -> Character {
        match self.buffer.get(self.position + offset) {
            Some(c) => Ch(*c),
            None => StreamEnd,
        }
    }

    /// Current position in the buffer (in characters)
    #[must_use]
    pub fn tell(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_read_and_look_ahead() {
        let mut stream = ByteStream::new();
        stream.read_from_str("ab");
        stream.close();

        assert_eq!(stream.read(), Ch('a'));
        assert_eq!(stream.look_ahead(1), Ch('b'));
        assert_eq!(stream.look_ahead(2), StreamEnd);
        assert_eq!(stream.next(), Ch('a'));
        assert_eq!(stream.next(), Ch('b'));
        assert_eq!(stream.next(), StreamEnd);
        assert!(stream.eof());
    }

    #[test]
    fn location_tracks_newlines() {
        let mut handler = LocationHandler::new(Location::default());
        for c in "a\nb\r\nc".chars() {
            handler.inc(Ch(c));
        }

        let loc = handler.cur_location();
        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 2);
        assert_eq!(loc.offset, 6);
    }

    #[test]
    fn location_counts_crlf_once() {
        let mut handler = LocationHandler::new(Location::default());
        handler.inc(Ch('\r'));
        handler.inc(Ch('\n'));

        assert_eq!(handler.cur_location().line, 2);
        assert_eq!(handler.cur_location().column, 1);
    }
}
