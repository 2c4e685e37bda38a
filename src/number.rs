//! Number parsing
//!
//! Numbers arrive as a complete token slice, already cut at a
//! context-dependent terminator by the caller. Classification is
//! purely lexical: a `0x`/`0o`/`0b` prefix selects a radix, a `.` or
//! exponent marker makes a float, and `inf`/`nan` with an optional
//! sign are the special floats. Underscores must sit between two
//! digits everywhere, and a non-zero decimal integer part must not
//! carry leading zeros.

use crate::char_class;
use crate::error::{ErrorKind, ParseError};
use crate::value::Value;

/// Parse a number token. `line`/`column` locate the token start for
/// diagnostics.
pub(crate) fn parse_number(token: &[u8], line: usize, column: usize) -> Result<Value, ParseError> {
    let fail = |message: String| ParseError::at(ErrorKind::Decode, message, line, column);

    if token.is_empty() {
        return Err(fail("empty number".to_string()));
    }

    let (sign, digits) = split_sign(token);

    if digits == b"inf" {
        return Ok(special_float(f64::INFINITY, sign));
    }
    if digits == b"nan" {
        return Ok(special_float(f64::NAN, sign));
    }

    // Radix prefixes are only legal unsigned.
    if sign == 0 && digits.len() >= 2 && digits[0] == b'0' {
        let radix = match digits[1] {
            b'x' => Some((16, char_class::is_hex_digit as fn(u8) -> bool)),
            b'o' => Some((8, char_class::is_oct_digit as fn(u8) -> bool)),
            b'b' => Some((2, char_class::is_bin_digit as fn(u8) -> bool)),
            _ => None,
        };
        if let Some((radix, is_digit)) = radix {
            return parse_radix(&digits[2..], radix, is_digit, line, column);
        }
    }

    if is_float_token(digits) {
        parse_float(token, digits, line, column)
    } else {
        parse_decimal_integer(token, digits, line, column)
    }
}

/// Split an optional leading sign. Returns -1, 0 or 1 and the rest.
fn split_sign(token: &[u8]) -> (i8, &[u8]) {
    match token.first() {
        Some(b'+') => (1, &token[1..]),
        Some(b'-') => (-1, &token[1..]),
        _ => (0, token),
    }
}

fn special_float(value: f64, sign: i8) -> Value {
    let value = if sign < 0 { -value } else { value };
    Value::Float {
        value,
        precision: 0,
        scientific: false,
    }
}

/// A token is a float when an unprefixed number contains `.` or an
/// exponent marker.
fn is_float_token(digits: &[u8]) -> bool {
    digits
        .iter()
        .any(|&b| b == b'.' || b == b'e' || b == b'E')
}

/// Hex, octal or binary payload after the two-byte prefix.
fn parse_radix(
    payload: &[u8],
    radix: u32,
    is_digit: fn(u8) -> bool,
    line: usize,
    column: usize,
) -> Result<Value, ParseError> {
    let fail = |message: String| ParseError::at(ErrorKind::Decode, message, line, column);

    let cleaned = strip_underscores(payload, is_digit)
        .map_err(|_| fail(format!("malformed base-{} integer", radix)))?;
    let text = std::str::from_utf8(&cleaned)
        .map_err(|_| fail(format!("malformed base-{} integer", radix)))?;

    let unsigned = u64::from_str_radix(text, radix)
        .map_err(|_| fail(format!("base-{} integer out of range", radix)))?;
    let value = i64::try_from(unsigned)
        .map_err(|_| fail(format!("base-{} integer out of range", radix)))?;
    Ok(Value::Integer(value))
}

fn parse_decimal_integer(
    token: &[u8],
    digits: &[u8],
    line: usize,
    column: usize,
) -> Result<Value, ParseError> {
    let fail = |message: &str| ParseError::at(ErrorKind::Decode, message, line, column);

    let cleaned = strip_underscores(digits, char_class::is_digit)
        .map_err(|_| fail("malformed integer"))?;
    if cleaned.len() > 1 && cleaned[0] == b'0' {
        return Err(fail("leading zeros are not allowed"));
    }

    let mut text = String::with_capacity(token.len());
    if token.first() == Some(&b'-') {
        text.push('-');
    }
    text.push_str(std::str::from_utf8(&cleaned).unwrap_or(""));

    let value: i64 = text.parse().map_err(|_| fail("integer out of range"))?;
    Ok(Value::Integer(value))
}

fn parse_float(
    token: &[u8],
    digits: &[u8],
    line: usize,
    column: usize,
) -> Result<Value, ParseError> {
    let fail = |message: &str| ParseError::at(ErrorKind::Decode, message, line, column);

    // Cut the exponent off the mantissa.
    let exp_at = digits.iter().position(|&b| b == b'e' || b == b'E');
    let (mantissa, exponent) = match exp_at {
        Some(i) => (&digits[..i], Some(&digits[i + 1..])),
        None => (digits, None),
    };

    // Mantissa: integer part, optionally `.` and a fraction, with the
    // dot sitting between two digits.
    let dot_at = mantissa.iter().position(|&b| b == b'.');
    let (int_part, frac_part) = match dot_at {
        Some(i) => (&mantissa[..i], Some(&mantissa[i + 1..])),
        None => (mantissa, None),
    };

    let int_clean = strip_underscores(int_part, char_class::is_digit)
        .map_err(|_| fail("malformed float"))?;
    if int_clean.len() > 1 && int_clean[0] == b'0' {
        return Err(fail("leading zeros are not allowed"));
    }

    let mut precision = 0;
    if let Some(frac) = frac_part {
        let frac_clean =
            strip_underscores(frac, char_class::is_digit).map_err(|_| fail("malformed float"))?;
        precision = frac_clean.len();
    }

    if let Some(exp) = exponent {
        let (_, exp_digits) = split_sign(exp);
        // Exponents may carry leading zeros, underscores still must sit
        // between digits.
        strip_underscores(exp_digits, char_class::is_digit)
            .map_err(|_| fail("malformed float exponent"))?;
    }

    let mut text = String::with_capacity(token.len());
    for &byte in token {
        if byte != b'_' {
            text.push(byte as char);
        }
    }
    let value: f64 = text.parse().map_err(|_| fail("malformed float"))?;

    Ok(Value::Float {
        value,
        precision,
        scientific: exponent.is_some(),
    })
}

/// Validate digit-and-underscore structure and return the digits with
/// underscores removed. Rejects empty payloads, stray underscores and
/// non-digit bytes.
fn strip_underscores(payload: &[u8], is_digit: fn(u8) -> bool) -> Result<Vec<u8>, ()> {
    if payload.is_empty() {
        return Err(());
    }
    let mut cleaned = Vec::with_capacity(payload.len());
    for (i, &byte) in payload.iter().enumerate() {
        if byte == b'_' {
            let before = i.checked_sub(1).map(|j| payload[j]);
            let after = payload.get(i + 1).copied();
            match (before, after) {
                (Some(b), Some(a)) if is_digit(b) && is_digit(a) => {}
                _ => return Err(()),
            }
        } else if is_digit(byte) {
            cleaned.push(byte);
        } else {
            return Err(());
        }
    }
    Ok(cleaned)
}
