//! The top-level driver and composite value parsing
//!
//! The driver interprets each line as blank, comment, `[table]` header,
//! `[[array-table]]` header or `key = value`, threading the active
//! table through the document builder. Keys and values recurse through
//! the scanner; scalar tokens (numbers, datetimes, booleans) are cut at
//! a context-dependent terminator set first and classified second, so
//! the lexical probe for "date-like" never needs more than the token
//! bytes themselves.

use log::debug;
use memchr::memchr2;

use crate::builder::{insert_dotted, DocumentBuilder, KeySegment};
use crate::char_class;
use crate::datetime;
use crate::error::{ErrorKind, ParseError};
use crate::number;
use crate::options::ParserOptions;
use crate::scanner::Scanner;
use crate::string;
use crate::table::Table;
use crate::value::Value;

/// Parse a complete document from an input buffer.
pub(crate) fn parse_document(buf: Vec<u8>, options: &ParserOptions) -> Result<Table, ParseError> {
    debug!("parsing {} byte document", buf.len());
    let mut scanner = Scanner::new(buf);
    let mut builder = DocumentBuilder::new(options);

    while scanner.has_more() {
        skip_ws(&mut scanner);
        match scanner.current() {
            0 if !scanner.has_more() => break,
            b'\n' => scanner.advance(),
            b'\r' => consume_crlf(&mut scanner)?,
            b'#' => skip_comment(&mut scanner)?,
            b'[' => {
                debug_assert!(scanner.at_line_start());
                parse_header(&mut scanner, &mut builder, options)?;
                expect_line_end(&mut scanner)?;
            }
            _ => {
                debug_assert!(scanner.at_line_start());
                parse_key_value(&mut scanner, &mut builder, options)?;
                expect_line_end(&mut scanner)?;
            }
        }
    }

    Ok(builder.into_root())
}

/// `[path]` or `[[path]]` starting at the opening bracket.
fn parse_header(
    scanner: &mut Scanner,
    builder: &mut DocumentBuilder,
    options: &ParserOptions,
) -> Result<(), ParseError> {
    let array = scanner.peek_ahead(1) == b'[';
    scanner.advance();
    if array {
        scanner.advance();
    }

    let path = parse_key_path(scanner, options)?;

    if array {
        if scanner.current() != b']' || scanner.peek_ahead(1) != b']' {
            return Err(scanner.error(ErrorKind::Decode, "expected `]]` to close the header"));
        }
        scanner.advance();
        scanner.advance();
        builder.open_array_table(&path)
    } else {
        if scanner.current() != b']' {
            return Err(scanner.error(ErrorKind::Decode, "expected `]` to close the header"));
        }
        scanner.advance();
        builder.open_table(&path)
    }
}

/// `key = value` starting at the first key byte.
fn parse_key_value(
    scanner: &mut Scanner,
    builder: &mut DocumentBuilder,
    options: &ParserOptions,
) -> Result<(), ParseError> {
    let path = parse_key_path(scanner, options)?;

    if scanner.current() != b'=' {
        return Err(scanner.error(ErrorKind::MissingSeparator, "expected `=` after key"));
    }
    scanner.advance();
    skip_ws(scanner);

    if at_line_end(scanner) {
        return Err(scanner.error(ErrorKind::MissingValue, "expected a value after `=`"));
    }

    let value = parse_value(scanner, options, &[])?;
    builder.insert(&path, value)
}

/// A dotted key path. Stops, without consuming, at the first byte after
/// the path's trailing whitespace (`=`, `]`, or anything unexpected).
fn parse_key_path(
    scanner: &mut Scanner,
    options: &ParserOptions,
) -> Result<Vec<KeySegment>, ParseError> {
    let mut path = Vec::new();
    loop {
        skip_ws(scanner);
        let (line, column) = scanner.position();
        let name = match scanner.current() {
            b'"' => string::parse_basic(scanner, options.max_key_len)?,
            b'\'' => string::parse_literal(scanner, options.max_key_len)?,
            byte if char_class::is_bare_key(byte) => bare_segment(scanner),
            _ => {
                return Err(scanner.error(ErrorKind::Decode, "expected a key"));
            }
        };
        if name.len() > options.max_key_len {
            return Err(ParseError::at(
                ErrorKind::BufferOverflow,
                format!("key exceeds {} bytes", options.max_key_len),
                line,
                column,
            ));
        }
        path.push(KeySegment { name, line, column });

        skip_ws(scanner);
        if scanner.current() == b'.' {
            scanner.advance();
            continue;
        }
        return Ok(path);
    }
}

fn bare_segment(scanner: &mut Scanner) -> String {
    let mut name = String::new();
    while char_class::is_bare_key(scanner.current()) {
        name.push(scanner.current() as char);
        scanner.advance();
    }
    name
}

/// Any value, dispatched on its first byte. `extra` holds the extra
/// terminator bytes of the enclosing context (`,]` inside arrays,
/// `,}` inside inline tables).
fn parse_value(
    scanner: &mut Scanner,
    options: &ParserOptions,
    extra: &[u8],
) -> Result<Value, ParseError> {
    match scanner.current() {
        b'"' | b'\'' => Ok(Value::String(string::parse_string(
            scanner,
            options.max_string_len,
        )?)),
        b'[' => parse_array(scanner, options),
        b'{' => parse_inline_table(scanner, options),
        _ => parse_scalar(scanner, extra),
    }
}

/// A number, datetime or boolean: cut the token at the terminator set,
/// then classify from the token bytes.
fn parse_scalar(scanner: &mut Scanner, extra: &[u8]) -> Result<Value, ParseError> {
    let (line, column) = scanner.position();
    let mut token = Vec::new();
    collect_until_terminator(scanner, extra, &mut token);

    // A date may carry its time after a single space separator. Probe
    // past the space for `HH:` and rewind; this is the one place the
    // grammar needs the scanner's bounded backtracking.
    if scanner.current() == b' ' && token.len() == 10 && datetime::looks_like_datetime(&token) {
        let mut probe = [0u8; 3];
        let mut moved = 0;
        for slot in probe.iter_mut() {
            if !scanner.has_more() {
                break;
            }
            scanner.advance();
            *slot = scanner.current();
            moved += 1;
        }
        scanner.backtrack(moved);

        if char_class::is_digit(probe[0])
            && char_class::is_digit(probe[1])
            && probe[2] == b':'
        {
            token.push(b' ');
            scanner.advance();
            collect_until_terminator(scanner, extra, &mut token);
        }
    }

    if token.is_empty() {
        return Err(ParseError::at(
            ErrorKind::MissingValue,
            "expected a value",
            line,
            column,
        ));
    }

    if token.as_slice() == b"true" {
        return Ok(Value::Boolean(true));
    }
    if token.as_slice() == b"false" {
        return Ok(Value::Boolean(false));
    }
    if datetime::looks_like_datetime(&token) {
        return datetime::parse_datetime(&token, line, column);
    }
    match token.first() {
        Some(b'0'..=b'9' | b'+' | b'-' | b'i' | b'n') => {
            number::parse_number(&token, line, column)
        }
        _ => Err(ParseError::at(
            ErrorKind::Decode,
            format!("invalid value `{}`", String::from_utf8_lossy(&token)),
            line,
            column,
        )),
    }
}

fn collect_until_terminator(scanner: &mut Scanner, extra: &[u8], token: &mut Vec<u8>) {
    while scanner.has_more() && !char_class::is_value_terminator(scanner.current(), extra) {
        token.push(scanner.current());
        scanner.advance();
    }
}

/// `[ value, value, ... ]` with newlines and comments permitted inside
/// and a trailing comma allowed.
fn parse_array(scanner: &mut Scanner, options: &ParserOptions) -> Result<Value, ParseError> {
    scanner.advance(); // `[`
    let mut items = Vec::new();

    loop {
        skip_ws_newlines_comments(scanner)?;
        if scanner.current() == b']' {
            scanner.advance();
            return Ok(Value::Array(items));
        }
        if !scanner.has_more() {
            return Err(scanner.error(ErrorKind::Decode, "unterminated array"));
        }

        if items.len() >= options.max_array_len {
            return Err(scanner.error(
                ErrorKind::BufferOverflow,
                format!("array exceeds {} elements", options.max_array_len),
            ));
        }
        items.push(parse_value(scanner, options, b",]")?);

        skip_ws_newlines_comments(scanner)?;
        match scanner.current() {
            b',' => scanner.advance(),
            b']' => {
                scanner.advance();
                return Ok(Value::Array(items));
            }
            _ => {
                return Err(scanner.error(ErrorKind::Decode, "expected `,` or `]` in array"));
            }
        }
    }
}

/// `{ key = value, ... }` on a single line, no trailing comma.
fn parse_inline_table(scanner: &mut Scanner, options: &ParserOptions) -> Result<Value, ParseError> {
    scanner.advance(); // `{`
    let mut table = Table::new();

    skip_ws(scanner);
    if scanner.current() == b'}' {
        scanner.advance();
        return Ok(Value::Table(table));
    }

    loop {
        if at_line_end(scanner) {
            return Err(inline_newline_error(scanner));
        }

        let path = parse_key_path(scanner, options)?;
        if scanner.current() != b'=' {
            return Err(scanner.error(ErrorKind::MissingSeparator, "expected `=` after key"));
        }
        scanner.advance();
        skip_ws(scanner);
        if at_line_end(scanner) {
            return Err(scanner.error(ErrorKind::MissingValue, "expected a value after `=`"));
        }

        let value = parse_value(scanner, options, b",}")?;
        insert_dotted(&mut table, &path, value, options.max_table_entries)?;

        skip_ws(scanner);
        match scanner.current() {
            b',' => {
                scanner.advance();
                skip_ws(scanner);
                if scanner.current() == b'}' {
                    return Err(scanner
                        .error(ErrorKind::Decode, "trailing comma in inline table"));
                }
            }
            b'}' => {
                scanner.advance();
                return Ok(Value::Table(table));
            }
            b'\n' | b'\r' => return Err(inline_newline_error(scanner)),
            _ => {
                return Err(scanner.error(ErrorKind::Decode, "expected `,` or `}` in inline table"));
            }
        }
    }
}

fn inline_newline_error(scanner: &Scanner) -> ParseError {
    if scanner.has_more() {
        scanner.error(ErrorKind::Decode, "newline in inline table")
    } else {
        scanner.error(ErrorKind::Decode, "unterminated inline table")
    }
}

/// Skip spaces and tabs.
fn skip_ws(scanner: &mut Scanner) {
    while char_class::is_ws(scanner.current()) && scanner.has_more() {
        scanner.advance();
    }
}

/// Skip whitespace, newlines and comments; used inside arrays.
fn skip_ws_newlines_comments(scanner: &mut Scanner) -> Result<(), ParseError> {
    loop {
        match scanner.current() {
            _ if !scanner.has_more() => return Ok(()),
            b' ' | b'\t' | b'\n' => scanner.advance(),
            b'\r' => consume_crlf(scanner)?,
            b'#' => skip_comment(scanner)?,
            _ => return Ok(()),
        }
    }
}

/// True at a newline, comment start, or end of input.
fn at_line_end(scanner: &Scanner) -> bool {
    !scanner.has_more()
        || matches!(scanner.current(), b'\n' | b'\r' | b'#')
}

/// After a header or key-value pair: only whitespace and a comment may
/// precede the newline or EOF.
fn expect_line_end(scanner: &mut Scanner) -> Result<(), ParseError> {
    skip_ws(scanner);
    match scanner.current() {
        _ if !scanner.has_more() => Ok(()),
        b'\n' => {
            scanner.advance();
            Ok(())
        }
        b'\r' => consume_crlf(scanner),
        b'#' => skip_comment(scanner),
        _ => Err(scanner.error(ErrorKind::Decode, "expected end of line")),
    }
}

/// Consume a comment up to, but not including, the line ending. The
/// bytes are scanned in bulk and checked against the comment control
/// class.
fn skip_comment(scanner: &mut Scanner) -> Result<(), ParseError> {
    let rest = scanner.remaining();
    let end = memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());

    if let Some(bad) = rest[..end]
        .iter()
        .position(|&b| char_class::is_ctrl_comment(b))
    {
        scanner.advance_by(bad);
        let byte = scanner.current();
        return Err(scanner.error(
            ErrorKind::Decode,
            format!("control character 0x{:02X} in comment", byte),
        ));
    }
    scanner.advance_by(end);
    Ok(())
}

/// Consume a CR that must begin a CRLF line ending.
fn consume_crlf(scanner: &mut Scanner) -> Result<(), ParseError> {
    if scanner.peek_ahead(1) != b'\n' {
        return Err(scanner.error(ErrorKind::Decode, "bare carriage return"));
    }
    scanner.advance();
    scanner.advance();
    Ok(())
}
