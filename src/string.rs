//! String value parsing
//!
//! The four TOML string forms, selected by the opening delimiter:
//! basic (`"..."`) and literal (`'...'`), each with a multi-line
//! variant opened by a tripled delimiter. Basic strings process the
//! escape set including `\uXXXX` / `\UXXXXXXXX` Unicode scalars;
//! literal strings take their bytes verbatim.
//!
//! All collectors work on raw bytes and validate UTF-8 once at the end,
//! so a malformed sequence anywhere in the string is a decode error at
//! the string's opening position.

use crate::char_class;
use crate::error::{ErrorKind, ParseError};
use crate::scanner::Scanner;

/// Parse any string value starting at the opening quote.
pub(crate) fn parse_string(scanner: &mut Scanner, max_len: usize) -> Result<String, ParseError> {
    match scanner.current() {
        b'"' => {
            if scanner.peek_ahead(1) == b'"' && scanner.peek_ahead(2) == b'"' {
                parse_multiline_basic(scanner, max_len)
            } else {
                parse_basic(scanner, max_len)
            }
        }
        b'\'' => {
            if scanner.peek_ahead(1) == b'\'' && scanner.peek_ahead(2) == b'\'' {
                parse_multiline_literal(scanner, max_len)
            } else {
                parse_literal(scanner, max_len)
            }
        }
        other => Err(scanner.error(
            ErrorKind::Decode,
            format!("expected a string, found `{}`", other as char),
        )),
    }
}

/// Basic single-line string: `"..."` with escapes.
pub(crate) fn parse_basic(scanner: &mut Scanner, max_len: usize) -> Result<String, ParseError> {
    let start = scanner.position();
    scanner.advance(); // opening quote
    let mut out = Vec::new();

    loop {
        let byte = scanner.current();
        if byte == b'"' {
            scanner.advance();
            return finish(out, start);
        }
        if !scanner.has_more() || char_class::is_newline(byte) {
            return Err(scanner.error(ErrorKind::Decode, "unterminated string"));
        }
        if byte == b'\\' {
            scanner.advance();
            decode_escape(scanner, &mut out)?;
        } else {
            if char_class::is_ctrl_single_line(byte) {
                return Err(control_error(scanner, byte));
            }
            out.push(byte);
            scanner.advance();
        }
        check_len(scanner, &out, max_len)?;
    }
}

/// Basic multi-line string: `"""..."""`.
fn parse_multiline_basic(scanner: &mut Scanner, max_len: usize) -> Result<String, ParseError> {
    let start = scanner.position();
    scanner.advance();
    scanner.advance();
    scanner.advance(); // opening delimiter
    skip_initial_newline(scanner);
    let mut out = Vec::new();

    loop {
        let byte = scanner.current();
        if byte == b'"' {
            if quote_run(scanner, b'"', &mut out)? {
                return finish(out, start);
            }
            check_len(scanner, &out, max_len)?;
            continue;
        }
        if !scanner.has_more() {
            return Err(scanner.error(ErrorKind::Decode, "unterminated string"));
        }
        match byte {
            b'\\' => {
                scanner.advance();
                if is_line_ending_backslash(scanner) {
                    fold_line(scanner)?;
                } else {
                    decode_escape(scanner, &mut out)?;
                }
            }
            b'\r' => {
                consume_crlf(scanner)?;
                out.push(b'\n');
            }
            _ => {
                if char_class::is_ctrl_multi_line(byte) {
                    return Err(control_error(scanner, byte));
                }
                out.push(byte);
                scanner.advance();
            }
        }
        check_len(scanner, &out, max_len)?;
    }
}

/// Literal single-line string: `'...'`, no escapes.
pub(crate) fn parse_literal(scanner: &mut Scanner, max_len: usize) -> Result<String, ParseError> {
    let start = scanner.position();
    scanner.advance(); // opening quote
    let mut out = Vec::new();

    loop {
        let byte = scanner.current();
        if byte == b'\'' {
            scanner.advance();
            return finish(out, start);
        }
        if !scanner.has_more() || char_class::is_newline(byte) {
            return Err(scanner.error(ErrorKind::Decode, "unterminated string"));
        }
        if char_class::is_ctrl_literal(byte) {
            return Err(control_error(scanner, byte));
        }
        out.push(byte);
        scanner.advance();
        check_len(scanner, &out, max_len)?;
    }
}

/// Literal multi-line string: `'''...'''`.
fn parse_multiline_literal(scanner: &mut Scanner, max_len: usize) -> Result<String, ParseError> {
    let start = scanner.position();
    scanner.advance();
    scanner.advance();
    scanner.advance(); // opening delimiter
    skip_initial_newline(scanner);
    let mut out = Vec::new();

    loop {
        let byte = scanner.current();
        if byte == b'\'' {
            if quote_run(scanner, b'\'', &mut out)? {
                return finish(out, start);
            }
            check_len(scanner, &out, max_len)?;
            continue;
        }
        if !scanner.has_more() {
            return Err(scanner.error(ErrorKind::Decode, "unterminated string"));
        }
        match byte {
            b'\r' => {
                consume_crlf(scanner)?;
                out.push(b'\n');
            }
            b'\n' => {
                out.push(b'\n');
                scanner.advance();
            }
            _ => {
                if char_class::is_ctrl_literal(byte) {
                    return Err(control_error(scanner, byte));
                }
                out.push(byte);
                scanner.advance();
            }
        }
        check_len(scanner, &out, max_len)?;
    }
}

/// Decode one escape designator (the byte after `\`) into `out`.
fn decode_escape(scanner: &mut Scanner, out: &mut Vec<u8>) -> Result<(), ParseError> {
    let designator = scanner.current();
    match designator {
        b'b' => out.push(0x08),
        b't' => out.push(b'\t'),
        b'n' => out.push(b'\n'),
        b'f' => out.push(0x0C),
        b'r' => out.push(b'\r'),
        b'"' => out.push(b'"'),
        b'\\' => out.push(b'\\'),
        b'u' => {
            scanner.advance();
            return unicode_escape(scanner, 4, out);
        }
        b'U' => {
            scanner.advance();
            return unicode_escape(scanner, 8, out);
        }
        _ => {
            return Err(scanner.error(
                ErrorKind::Decode,
                format!("invalid escape `\\{}`", printable(designator)),
            ));
        }
    }
    scanner.advance();
    Ok(())
}

/// Decode `digits` hex digits into a Unicode scalar and push its UTF-8
/// encoding.
fn unicode_escape(scanner: &mut Scanner, digits: u32, out: &mut Vec<u8>) -> Result<(), ParseError> {
    let mut code: u32 = 0;
    for _ in 0..digits {
        let byte = scanner.current();
        if !char_class::is_hex_digit(byte) {
            return Err(scanner.error(
                ErrorKind::Decode,
                format!("expected {} hex digits in Unicode escape", digits),
            ));
        }
        code = code
            .checked_mul(16)
            .and_then(|c| c.checked_add(hex_value(byte)))
            .unwrap_or(u32::MAX);
        scanner.advance();
    }
    // from_u32 rejects surrogates and anything past U+10FFFF.
    match char::from_u32(code) {
        Some(ch) => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            Ok(())
        }
        None => Err(scanner.error(
            ErrorKind::Decode,
            format!("U+{:04X} is not a Unicode scalar value", code),
        )),
    }
}

#[inline]
fn hex_value(byte: u8) -> u32 {
    match byte {
        b'0'..=b'9' => (byte - b'0') as u32,
        b'a'..=b'f' => (byte - b'a' + 10) as u32,
        _ => (byte - b'A' + 10) as u32,
    }
}

/// True when the byte after a backslash begins a line-ending fold:
/// nothing but whitespace up to the end of the line.
fn is_line_ending_backslash(scanner: &Scanner) -> bool {
    let mut k = 0;
    loop {
        match scanner.peek_ahead(k) {
            b' ' | b'\t' => k += 1,
            b'\n' | b'\r' => return true,
            _ => return false,
        }
    }
}

/// Consume the whitespace, the newline and all following whitespace and
/// newlines after a line-ending backslash.
fn fold_line(scanner: &mut Scanner) -> Result<(), ParseError> {
    loop {
        match scanner.current() {
            b' ' | b'\t' | b'\n' => scanner.advance(),
            b'\r' => consume_crlf(scanner)?,
            _ => return Ok(()),
        }
        if !scanner.has_more() {
            return Ok(());
        }
    }
}

/// Handle a run of closing-delimiter bytes inside a multi-line string.
///
/// Returns true when the run closed the string, false when the quotes
/// were content. A run longer than five cannot be split into content
/// plus terminator and is a decode error.
fn quote_run(scanner: &mut Scanner, quote: u8, out: &mut Vec<u8>) -> Result<bool, ParseError> {
    let mut run = 0;
    while scanner.peek_ahead(run) == quote {
        run += 1;
    }
    if run >= 3 {
        if run > 5 {
            return Err(scanner.error(ErrorKind::Decode, "too many quotes at string end"));
        }
        // Up to two quotes directly before the terminator are content.
        for _ in 0..run - 3 {
            out.push(quote);
        }
        for _ in 0..run {
            scanner.advance();
        }
        Ok(true)
    } else {
        for _ in 0..run {
            out.push(quote);
            scanner.advance();
        }
        Ok(false)
    }
}

/// Strip one newline (LF or CRLF) directly after a multi-line opener.
fn skip_initial_newline(scanner: &mut Scanner) {
    if scanner.current() == b'\r' && scanner.peek_ahead(1) == b'\n' {
        scanner.advance();
        scanner.advance();
    } else if scanner.current() == b'\n' {
        scanner.advance();
    }
}

/// Consume a CR that must be part of a CRLF pair.
fn consume_crlf(scanner: &mut Scanner) -> Result<(), ParseError> {
    if scanner.peek_ahead(1) != b'\n' {
        return Err(scanner.error(ErrorKind::Decode, "bare carriage return"));
    }
    scanner.advance();
    scanner.advance();
    Ok(())
}

fn check_len(scanner: &Scanner, out: &[u8], max_len: usize) -> Result<(), ParseError> {
    if out.len() > max_len {
        return Err(scanner.error(
            ErrorKind::BufferOverflow,
            format!("string exceeds {} bytes", max_len),
        ));
    }
    Ok(())
}

fn control_error(scanner: &Scanner, byte: u8) -> ParseError {
    scanner.error(
        ErrorKind::Decode,
        format!("control character 0x{:02X} in string", byte),
    )
}

fn finish(out: Vec<u8>, start: (usize, usize)) -> Result<String, ParseError> {
    String::from_utf8(out).map_err(|_| {
        ParseError::at(ErrorKind::Decode, "string is not valid UTF-8", start.0, start.1)
    })
}

fn printable(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        (byte as char).to_string()
    } else {
        format!("0x{:02X}", byte)
    }
}
