//! Byte scanner for XML delimiter detection
//!
//! Uses memchr for fast byte and substring searching.

use memchr::{memchr, memmem};

/// Scanner for XML delimiter detection
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Total input length
    #[inline]
    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get a slice from start to end positions
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
            self.pos += 1;
        }
    }

    /// Find next '<' (tag start)
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside quotes
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut in_single_quote = false;
        let mut in_double_quote = false;

        for (offset, &b) in self.input[self.pos..].iter().enumerate() {
            match b {
                b'"' if !in_single_quote => in_double_quote = !in_double_quote,
                b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
                b'>' if !in_single_quote && !in_double_quote => return Some(self.pos + offset),
                _ => {}
            }
        }
        None
    }

    /// Find the next occurrence of a byte sequence, returning its start
    #[inline]
    pub fn find_seq(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Read an XML name, advancing past it
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if !is_name_start_char(*self.input.get(start)?) {
            return None;
        }
        self.pos += 1;
        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

/// Check if byte is XML whitespace
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

/// Check that a whole string is a well-formed XML name
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(&first) if is_name_start_char(first) => bytes[1..].iter().all(|&b| is_name_char(b)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_tag_start(), Some(6));
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new(b"<a attr=\">test\">content");
        assert_eq!(scanner.find_tag_end_quoted(), Some(15));
    }

    #[test]
    fn test_find_seq() {
        let mut scanner = Scanner::new(b"<!-- a -- b -->tail");
        scanner.advance(4);
        assert_eq!(scanner.find_seq(b"-->"), Some(12));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"element-name>");
        assert_eq!(scanner.read_name(), Some(b"element-name" as &[u8]));
        assert_eq!(scanner.position(), 12);
    }

    #[test]
    fn test_skip_whitespace() {
        let mut scanner = Scanner::new(b"  \t\n hello");
        scanner.skip_whitespace();
        assert_eq!(scanner.position(), 5);
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("item"));
        assert!(is_valid_name("ns:item-2"));
        assert!(is_valid_name("_private"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2item"));
        assert!(!is_valid_name("has space"));
    }
}
