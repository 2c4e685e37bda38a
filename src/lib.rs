//! Tomlet - TOML v1.0.0 parser with a type-tagged JSON emitter
//!
//! Tomlet parses TOML documents into an owned tree of typed values and
//! re-emits that tree in the JSON-shaped, type-tagged form used by
//! conformance suites. It provides:
//! - A byte-driven scanner with line/column tracking and bounded
//!   backtracking
//! - The full TOML 1.0.0 value grammar: four string forms, integers in
//!   four bases, floats, booleans and the nine RFC 3339 date/time
//!   shapes
//! - Document assembly with the TOML redefinition rules (dotted keys,
//!   table headers, arrays of tables, inline tables)
//! - Errors carrying `line:column` positions and a failure kind
//! - Construction-time limits for input, key, string, table and array
//!   sizes
//!
//! ## Quick Start
//!
//! ```rust
//! use tomlet::Value;
//!
//! let doc = tomlet::parse_str(r#"
//! title = "example"
//!
//! [owner]
//! name = "tom"
//! "#).unwrap();
//!
//! let name = doc.get_path(&["owner", "name"]).and_then(|n| n.as_value());
//! assert_eq!(name.and_then(Value::as_str), Some("tom"));
//! ```
//!
//! ## Tagged-JSON emission
//!
//! ```rust
//! let doc = tomlet::parse_str("x = 0xDEAD_BEEF").unwrap();
//! assert_eq!(
//!     doc.to_tagged_json_string(),
//!     r#"{"x":{"type":"integer","value":"3735928559"}}"#
//! );
//! ```
//!
//! ## Errors
//!
//! ```rust
//! use tomlet::ErrorKind;
//!
//! let err = tomlet::parse_str("a = 1\n[a]\n").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::DuplicateKey);
//! assert_eq!((err.line(), err.column()), (2, 2));
//! ```

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

mod builder;
mod char_class;
mod datetime;
mod number;
mod parser;
mod scanner;
mod string;

pub mod emit;
pub mod error;
pub mod options;
pub mod table;
pub mod value;

pub use error::{ErrorKind, ParseError};
pub use options::ParserOptions;
pub use table::{Node, Table};
pub use value::{Date, Time, UtcOffset, Value};

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A parsed TOML document: the root table plus its serializations.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Table,
}

impl Document {
    /// The root table.
    pub fn root(&self) -> &Table {
        &self.root
    }

    /// A top-level child by segment.
    pub fn get(&self, segment: &str) -> Option<&Node> {
        self.root.get(segment)
    }

    /// The node at a path of segments, descending through tables of any
    /// flavor.
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        self.root.get_path(path)
    }

    /// Like [`Document::get_path`], but a miss is a
    /// [`KeyNotFound`](ErrorKind::KeyNotFound) error naming the path.
    pub fn try_get_path(&self, path: &[&str]) -> Result<&Node, ParseError> {
        self.get_path(path).ok_or_else(|| {
            ParseError::new(
                ErrorKind::KeyNotFound,
                format!("no key at `{}`", path.join(".")),
            )
        })
    }

    /// The tagged-JSON serialization as a [`serde_json::Value`].
    pub fn to_tagged_json(&self) -> serde_json::Value {
        emit::table_to_json(&self.root)
    }

    /// The tagged-JSON serialization as compact text.
    pub fn to_tagged_json_string(&self) -> String {
        self.to_tagged_json().to_string()
    }
}

/// A configured parser. The free functions in the crate root use the
/// default configuration; build one of these to change limits.
///
/// ```rust
/// use tomlet::{Parser, ParserOptions, ErrorKind};
///
/// let parser = Parser::with_options(ParserOptions::default().with_max_string_len(4));
/// let err = parser.parse_str("s = \"too long\"").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::BufferOverflow);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    /// A parser with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser with the given limits.
    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    /// The configured limits.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse an in-memory string.
    pub fn parse_str(&self, input: &str) -> Result<Document, ParseError> {
        self.parse_slice(input.as_bytes())
    }

    /// Parse an in-memory byte buffer.
    pub fn parse_slice(&self, input: &[u8]) -> Result<Document, ParseError> {
        if input.len() > self.options.max_input_len {
            return Err(ParseError::new(
                ErrorKind::BufferOverflow,
                format!("input exceeds {} bytes", self.options.max_input_len),
            ));
        }
        let root = parser::parse_document(input.to_vec(), &self.options)?;
        Ok(Document { root })
    }

    /// Read a handle to EOF and parse the bytes. The handle is not
    /// closed; the caller keeps ownership.
    pub fn parse_reader<R: Read>(&self, reader: &mut R) -> Result<Document, ParseError> {
        let limit = self.options.max_input_len as u64;
        let mut buf = Vec::new();
        reader
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)?;
        if buf.len() > self.options.max_input_len {
            return Err(ParseError::new(
                ErrorKind::BufferOverflow,
                format!("input exceeds {} bytes", self.options.max_input_len),
            ));
        }
        let root = parser::parse_document(buf, &self.options)?;
        Ok(Document { root })
    }

    /// Open a file, size-check it, and parse its contents. Errors carry
    /// the file name in their display prefix.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document, ParseError> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let mut file = File::open(path).map_err(|e| {
            ParseError::new(ErrorKind::Read, e.to_string()).with_input_name(name.clone())
        })?;
        self.parse_reader(&mut file)
            .map_err(|e| e.with_input_name(name))
    }
}

/// Parse an in-memory string with default limits.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    Parser::new().parse_str(input)
}

/// Parse an in-memory byte buffer with default limits.
pub fn parse_slice(input: &[u8]) -> Result<Document, ParseError> {
    Parser::new().parse_slice(input)
}

/// Read a handle to EOF and parse it with default limits.
pub fn parse_reader<R: Read>(reader: &mut R) -> Result<Document, ParseError> {
    Parser::new().parse_reader(reader)
}

/// Open, read and parse a file with default limits.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document, ParseError> {
    Parser::new().parse_file(path)
}
