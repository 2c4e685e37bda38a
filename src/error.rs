//! Parse errors with source positions
//!
//! Every fallible operation in this crate reports a [`ParseError`]: an
//! error kind, a human-readable message and the `(line, column)` the
//! scanner was at when the failure was detected. The `Display` form is
//! `file:line:column: message` when an input name is known and
//! `line:column: message` otherwise.

use std::fmt;
use std::io;

/// Classification of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lexical rejection: a byte or token the grammar does not accept.
    Decode,
    /// Input IO failure while sourcing bytes.
    Read,
    /// A typed accessor was applied to a value of another type.
    Cast,
    /// Redefinition rule violation (see the document builder).
    DuplicateKey,
    /// No `=` where a key-value separator was expected.
    MissingSeparator,
    /// An `=` with no value following it.
    MissingValue,
    /// Accessor miss: no child with the requested segment.
    KeyNotFound,
    /// A configured limit was exceeded.
    BufferOverflow,
}

impl ErrorKind {
    /// Stable lowercase name, used in diagnostics and tests.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Decode => "decode",
            ErrorKind::Read => "read",
            ErrorKind::Cast => "cast",
            ErrorKind::DuplicateKey => "duplicate-key",
            ErrorKind::MissingSeparator => "missing-separator",
            ErrorKind::MissingValue => "missing-value",
            ErrorKind::KeyNotFound => "key-not-found",
            ErrorKind::BufferOverflow => "buffer-overflow",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parse failure with its source position.
///
/// Position-less failures (IO errors before scanning starts, accessor
/// misses on a finished tree) carry line 0 and render without the
/// `line:column:` prefix.
#[derive(Debug, Clone)]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
    line: usize,
    column: usize,
    input_name: Option<String>,
}

impl ParseError {
    /// Create an error at a source position. Lines and columns are
    /// 1-based.
    pub fn at(kind: ErrorKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
            input_name: None,
        }
    }

    /// Create a position-less error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::at(kind, message, 0, 0)
    }

    /// Attach the name of the input (file path) for diagnostics.
    pub fn with_input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = Some(name.into());
        self
    }

    /// The error classification.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The diagnostic message without the position prefix.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line of the failure, or 0 when no position applies.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column of the failure, or 0 when no position applies.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// The input name, if one was attached.
    #[inline]
    pub fn input_name(&self) -> Option<&str> {
        self.input_name.as_deref()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.input_name {
            write!(f, "{}:", name)?;
        }
        if self.line > 0 {
            write!(f, "{}:{}: ", self.line, self.column)?;
        } else if self.input_name.is_some() {
            write!(f, " ")?;
        }
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        ParseError::new(ErrorKind::Read, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position() {
        let err = ParseError::at(ErrorKind::Decode, "invalid escape", 3, 14);
        assert_eq!(format!("{}", err), "3:14: invalid escape");
    }

    #[test]
    fn test_display_with_input_name() {
        let err = ParseError::at(ErrorKind::DuplicateKey, "key `a` redefined", 7, 1)
            .with_input_name("config.toml");
        assert_eq!(format!("{}", err), "config.toml:7:1: key `a` redefined");
    }

    #[test]
    fn test_display_without_position() {
        let err = ParseError::new(ErrorKind::Read, "file not found");
        assert_eq!(format!("{}", err), "file not found");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Decode.name(), "decode");
        assert_eq!(ErrorKind::DuplicateKey.name(), "duplicate-key");
        assert_eq!(ErrorKind::MissingSeparator.name(), "missing-separator");
        assert_eq!(ErrorKind::BufferOverflow.name(), "buffer-overflow");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err: ParseError = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Read);
        assert_eq!(err.line(), 0);
    }
}
