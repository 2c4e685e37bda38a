//! Byte scanner with bounded backtracking
//!
//! The scanner owns the input buffer and exposes the cursor model the
//! grammar is written against: the current byte, a two-byte history, and
//! a rewind of at most [`MAX_BACKTRACK`] bytes. Positions of recently
//! consumed bytes are kept in a small ring so a rewind restores
//! line/column state exactly instead of replaying the input.
//!
//! End of input is modelled the way a NUL-terminated buffer behaves: the
//! first advance past the last byte loads a NUL that token collectors may
//! observe once, and [`Scanner::has_more`] turns false.

use crate::char_class;
use crate::error::{ErrorKind, ParseError};

/// The grammar never rewinds further than this many bytes.
pub(crate) const MAX_BACKTRACK: usize = 4;

/// Ring capacity. Must exceed `MAX_BACKTRACK + 4` so a rewind can restore
/// the position of every byte it touches.
const HISTORY: usize = 16;

/// Cursor over a fully buffered input.
pub(crate) struct Scanner {
    buf: Vec<u8>,
    /// Index one past the byte currently in `cur`.
    pos: usize,
    cur: u8,
    prev: u8,
    prev2: u8,
    /// Set once the NUL sentinel has been loaded.
    eof: bool,
    /// 1-based line of `cur`.
    line: usize,
    /// 1-based column of `cur`.
    column: usize,
    /// True while only whitespace precedes `cur` on its line.
    line_start: bool,
    /// `(line, column)` of recently consumed bytes, keyed by byte index.
    ring: [(usize, usize); HISTORY],
}

impl Scanner {
    /// Build a scanner over `buf` and load the first byte.
    pub(crate) fn new(buf: Vec<u8>) -> Self {
        let mut scanner = Self {
            buf,
            pos: 0,
            cur: 0,
            prev: 0,
            prev2: 0,
            eof: false,
            line: 1,
            column: 0,
            line_start: true,
            ring: [(1, 0); HISTORY],
        };
        scanner.advance();
        scanner
    }

    /// The byte under the cursor. NUL once the input is exhausted.
    #[inline]
    pub(crate) fn current(&self) -> u8 {
        self.cur
    }

    /// The byte before the cursor.
    #[inline]
    pub(crate) fn previous(&self) -> u8 {
        self.prev
    }

    /// The byte two before the cursor.
    #[inline]
    pub(crate) fn prev_previous(&self) -> u8 {
        self.prev2
    }

    /// True while the current byte is real input, false once the NUL
    /// sentinel has been loaded.
    #[inline]
    pub(crate) fn has_more(&self) -> bool {
        !self.eof
    }

    /// `(line, column)` of the current byte.
    #[inline]
    pub(crate) fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// True while only whitespace precedes the current byte on its line.
    #[inline]
    pub(crate) fn at_line_start(&self) -> bool {
        self.line_start
    }

    /// Byte `k` positions ahead of the cursor without consuming, NUL past
    /// the end. `peek_ahead(0)` is `current()`.
    #[inline]
    pub(crate) fn peek_ahead(&self, k: usize) -> u8 {
        let idx = self.pos + k;
        if idx == 0 {
            return 0;
        }
        self.buf.get(idx - 1).copied().unwrap_or(0)
    }

    /// Consume the current byte and load the next one.
    pub(crate) fn advance(&mut self) {
        self.prev2 = self.prev;
        self.prev = self.cur;

        if self.pos < self.buf.len() {
            self.cur = self.buf[self.pos];
            if self.pos == 0 {
                self.column = 1;
                self.line_start = true;
            } else if char_class::is_newline(self.prev) {
                self.line += 1;
                self.column = 1;
                self.line_start = true;
            } else {
                self.column += 1;
                if !char_class::is_ws(self.prev) {
                    self.line_start = false;
                }
            }
            self.ring[self.pos % HISTORY] = (self.line, self.column);
            self.pos += 1;
        } else if !self.eof {
            // The NUL sentinel: readable once, then has_more() is false.
            // It occupies a position of its own so backtracking from the
            // end of input stays uniform.
            self.cur = 0;
            self.eof = true;
            if self.pos > 0 && char_class::is_newline(self.prev) {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.ring[self.pos % HISTORY] = (self.line, self.column);
            self.pos += 1;
        }
    }

    /// The unread input starting at the current byte. Empty at EOF.
    #[inline]
    pub(crate) fn remaining(&self) -> &[u8] {
        if self.eof {
            &[]
        } else {
            &self.buf[self.pos - 1..]
        }
    }

    /// Consume `n` bytes.
    pub(crate) fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// A parse error at the current cursor position.
    pub(crate) fn error(&self, kind: ErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::at(kind, message, self.line, self.column)
    }

    /// Rewind the cursor so the current byte is `n` positions earlier.
    ///
    /// Internally moves back `n + 2` bytes and re-advances twice so the
    /// two-byte history is coherent. A distance above [`MAX_BACKTRACK`]
    /// or past the start of the buffer is a bug in the grammar, not a
    /// parse error.
    pub(crate) fn backtrack(&mut self, n: usize) {
        debug_assert!(n <= MAX_BACKTRACK, "backtrack distance exceeds grammar bound");
        let steps = n + 2;
        debug_assert!(self.pos >= steps, "backtrack past start of input");

        self.pos -= steps;
        self.eof = false;

        // Seed the history for the two re-advances.
        self.prev2 = self.byte_before(3);
        self.prev = self.byte_before(2);
        self.cur = self.byte_before(1);
        let (line, column) = if self.pos == 0 {
            (1, 0)
        } else {
            self.ring[(self.pos - 1) % HISTORY]
        };
        self.line = line;
        self.column = column;

        self.advance_restored();
        self.advance_restored();

        // The re-advances exist to keep the two-byte history coherent.
        debug_assert_eq!(self.previous(), self.byte_before(2));
        debug_assert_eq!(self.prev_previous(), self.byte_before(3));
    }

    /// Byte `k` positions before `self.pos`, NUL when out of range.
    #[inline]
    fn byte_before(&self, k: usize) -> u8 {
        if self.pos < k {
            0
        } else {
            self.buf.get(self.pos - k).copied().unwrap_or(0)
        }
    }

    /// `advance` variant used during a rewind: positions come from the
    /// ring instead of being recomputed, so columns survive newlines in
    /// the rewound region.
    fn advance_restored(&mut self) {
        self.prev2 = self.prev;
        self.prev = self.cur;
        if self.pos < self.buf.len() {
            self.cur = self.buf[self.pos];
            let (line, column) = self.ring[self.pos % HISTORY];
            self.line = line;
            self.column = column;
            self.line_start = column == 1 || (self.line_start && char_class::is_ws(self.prev));
            self.pos += 1;
        } else if !self.eof {
            self.cur = 0;
            self.eof = true;
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> Scanner {
        Scanner::new(input.as_bytes().to_vec())
    }

    #[test]
    fn test_initial_state() {
        let scanner = scan("abc");
        assert_eq!(scanner.current(), b'a');
        assert_eq!(scanner.previous(), 0);
        assert_eq!(scanner.prev_previous(), 0);
        assert!(scanner.has_more());
        assert_eq!(scanner.position(), (1, 1));
        assert!(scanner.at_line_start());
    }

    #[test]
    fn test_advance_shifts_history() {
        let mut scanner = scan("abc");
        scanner.advance();
        assert_eq!(scanner.current(), b'b');
        assert_eq!(scanner.previous(), b'a');
        scanner.advance();
        assert_eq!(scanner.current(), b'c');
        assert_eq!(scanner.previous(), b'b');
        assert_eq!(scanner.prev_previous(), b'a');
    }

    #[test]
    fn test_eof_nul_readable_once() {
        let mut scanner = scan("x");
        assert!(scanner.has_more());
        scanner.advance();
        assert_eq!(scanner.current(), 0);
        assert!(!scanner.has_more());
        assert_eq!(scanner.previous(), b'x');
    }

    #[test]
    fn test_empty_input() {
        let scanner = scan("");
        assert_eq!(scanner.current(), 0);
        assert!(!scanner.has_more());
    }

    #[test]
    fn test_line_column_tracking() {
        let mut scanner = scan("ab\ncd");
        assert_eq!(scanner.position(), (1, 1));
        scanner.advance();
        assert_eq!(scanner.position(), (1, 2));
        scanner.advance(); // '\n'
        assert_eq!(scanner.position(), (1, 3));
        scanner.advance(); // 'c'
        assert_eq!(scanner.position(), (2, 1));
        assert!(scanner.at_line_start());
        scanner.advance(); // 'd'
        assert_eq!(scanner.position(), (2, 2));
        assert!(!scanner.at_line_start());
    }

    #[test]
    fn test_line_start_survives_leading_whitespace() {
        let mut scanner = scan("  \tk = 1");
        scanner.advance();
        scanner.advance();
        scanner.advance(); // now on 'k'
        assert_eq!(scanner.current(), b'k');
        assert!(scanner.at_line_start());
        scanner.advance(); // now on ' ', past 'k'
        assert!(!scanner.at_line_start());
    }

    #[test]
    fn test_peek_ahead() {
        let scanner = scan("abcd");
        assert_eq!(scanner.peek_ahead(0), b'a');
        assert_eq!(scanner.peek_ahead(1), b'b');
        assert_eq!(scanner.peek_ahead(3), b'd');
        assert_eq!(scanner.peek_ahead(4), 0);
    }

    #[test]
    fn test_backtrack_restores_cursor_and_history() {
        let mut scanner = scan("abcdef");
        for _ in 0..4 {
            scanner.advance();
        }
        assert_eq!(scanner.current(), b'e');
        scanner.backtrack(2);
        assert_eq!(scanner.current(), b'c');
        assert_eq!(scanner.previous(), b'b');
        assert_eq!(scanner.prev_previous(), b'a');
        assert_eq!(scanner.position(), (1, 3));
    }

    #[test]
    fn test_backtrack_across_newline_restores_column() {
        let mut scanner = scan("ab\ncd");
        for _ in 0..4 {
            scanner.advance();
        }
        assert_eq!(scanner.current(), b'd');
        assert_eq!(scanner.position(), (2, 2));
        scanner.backtrack(3);
        assert_eq!(scanner.current(), b'b');
        assert_eq!(scanner.position(), (1, 2));
        assert_eq!(scanner.previous(), b'a');
    }

    #[test]
    fn test_backtrack_after_eof() {
        let mut scanner = scan("ab");
        scanner.advance();
        scanner.advance(); // NUL sentinel
        assert!(!scanner.has_more());
        scanner.backtrack(1);
        assert_eq!(scanner.current(), b'b');
        assert!(scanner.has_more());
    }

    #[test]
    fn test_backtrack_max_distance() {
        let mut scanner = scan("abcdefgh");
        for _ in 0..6 {
            scanner.advance();
        }
        assert_eq!(scanner.current(), b'g');
        scanner.backtrack(4);
        assert_eq!(scanner.current(), b'c');
        assert_eq!(scanner.previous(), b'b');
    }
}
