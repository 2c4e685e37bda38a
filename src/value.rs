//! Typed TOML values
//!
//! [`Value`] is the sum type over the ten TOML value shapes. Date and
//! time values keep the broken-down components the grammar validated
//! rather than an epoch representation, and an offset datetime always
//! carries its UTC offset.
//!
//! Floats remember two facts about their source spelling: how many
//! fractional digits were written and whether scientific notation was
//! used. The tagged-JSON emitter uses both to re-render the number the
//! way the document spelled it.

use std::fmt;

use crate::error::{ErrorKind, ParseError};
use crate::table::Table;

/// A calendar date: year, month, day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    /// Four-digit year.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31 bounded by the month length.
    pub day: u8,
}

impl Date {
    /// True when the month exists and the day fits the month, applying
    /// the Gregorian leap rule to February.
    pub fn is_valid(&self) -> bool {
        if self.month < 1 || self.month > 12 || self.day < 1 {
            return false;
        }
        self.day <= days_in_month(self.year, self.month)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Days in a Gregorian month.
fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Gregorian leap rule: divisible by 4, except centuries not divisible
/// by 400.
fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// A wall-clock time: hour, minute, second and optional fractional
/// seconds.
///
/// The fraction is kept as the source digits, padded to at least three
/// (milliseconds); longer runs are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Time {
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
    /// Fractional-second digits, at least three when present.
    pub fraction: Option<String>,
}

impl Time {
    /// True when every component is inside its RFC 3339 range.
    pub fn is_valid(&self) -> bool {
        self.hour <= 23 && self.minute <= 59 && self.second <= 59
    }

    /// The milliseconds encoded by the first three fraction digits, 0
    /// when no fraction was written.
    pub fn millis(&self) -> u32 {
        match self.fraction {
            Some(ref digits) => {
                let ms = digits.get(..3).unwrap_or(digits.as_str());
                ms.parse().unwrap_or(0)
            }
            None => 0,
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if let Some(ref digits) = self.fraction {
            write!(f, ".{}", digits)?;
        }
        Ok(())
    }
}

/// A UTC offset: either `Z` or a signed distance in minutes.
///
/// `Z` and `+00:00` carry the same instant but are distinct spellings,
/// and the emitter reproduces whichever the document used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtcOffset {
    /// The `Z` / `z` suffix.
    Z,
    /// `+HH:MM` or `-HH:MM`, stored as signed minutes east of UTC.
    Minutes(i16),
}

impl UtcOffset {
    /// The offset as signed minutes east of UTC. `Z` is 0.
    pub fn as_minutes(&self) -> i16 {
        match self {
            UtcOffset::Z => 0,
            UtcOffset::Minutes(m) => *m,
        }
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtcOffset::Z => f.write_str("Z"),
            UtcOffset::Minutes(m) => {
                let sign = if *m < 0 { '-' } else { '+' };
                let abs = m.unsigned_abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
        }
    }
}

/// A parsed TOML value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A 64-bit signed integer, whatever base it was written in.
    Integer(i64),
    /// A 64-bit float plus the spelling facts the emitter needs.
    Float {
        /// The numeric value.
        value: f64,
        /// Fractional digits written in the source.
        precision: usize,
        /// True when the source used an `e`/`E` exponent.
        scientific: bool,
    },
    /// `true` or `false`.
    Boolean(bool),
    /// A UTF-8 string, any of the four source forms.
    String(String),
    /// `1979-05-27T07:32:00-08:00` and friends.
    OffsetDateTime {
        /// The date half.
        date: Date,
        /// The time half.
        time: Time,
        /// The UTC offset, always preserved.
        offset: UtcOffset,
    },
    /// A datetime with no offset.
    LocalDateTime {
        /// The date half.
        date: Date,
        /// The time half.
        time: Time,
    },
    /// A date with no time.
    LocalDate(Date),
    /// A time with no date.
    LocalTime(Time),
    /// An ordered, possibly heterogeneous sequence.
    Array(Vec<Value>),
    /// An inline table, carrying its sub-table explicitly.
    Table(Table),
}

impl Value {
    /// Human-readable type name used in cast diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float { .. } => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::OffsetDateTime { .. } => "offset date-time",
            Value::LocalDateTime { .. } => "local date-time",
            Value::LocalDate(_) => "local date",
            Value::LocalTime(_) => "local time",
            Value::Array(_) => "array",
            Value::Table(_) => "inline table",
        }
    }

    /// The string payload, or `None` for any other type.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The integer payload, or `None` for any other type.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The float payload, or `None` for any other type.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The boolean payload, or `None` for any other type.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The array elements, or `None` for any other type.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The inline-table payload, or `None` for any other type.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The date of a local date or any datetime, `None` otherwise.
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Value::LocalDate(date) => Some(date),
            Value::LocalDateTime { date, .. } => Some(date),
            Value::OffsetDateTime { date, .. } => Some(date),
            _ => None,
        }
    }

    /// The time of a local time or any datetime, `None` otherwise.
    pub fn as_time(&self) -> Option<&Time> {
        match self {
            Value::LocalTime(time) => Some(time),
            Value::LocalDateTime { time, .. } => Some(time),
            Value::OffsetDateTime { time, .. } => Some(time),
            _ => None,
        }
    }

    /// The UTC offset of an offset datetime, `None` otherwise.
    pub fn as_offset(&self) -> Option<UtcOffset> {
        match self {
            Value::OffsetDateTime { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// The string payload, or a `cast` error naming the actual type.
    pub fn try_str(&self) -> Result<&str, ParseError> {
        self.as_str().ok_or_else(|| self.cast_error("string"))
    }

    /// The integer payload, or a `cast` error naming the actual type.
    pub fn try_integer(&self) -> Result<i64, ParseError> {
        self.as_integer().ok_or_else(|| self.cast_error("integer"))
    }

    /// The float payload, or a `cast` error naming the actual type.
    pub fn try_float(&self) -> Result<f64, ParseError> {
        self.as_float().ok_or_else(|| self.cast_error("float"))
    }

    /// The boolean payload, or a `cast` error naming the actual type.
    pub fn try_bool(&self) -> Result<bool, ParseError> {
        self.as_bool().ok_or_else(|| self.cast_error("boolean"))
    }

    /// The array payload, or a `cast` error naming the actual type.
    pub fn try_array(&self) -> Result<&[Value], ParseError> {
        self.as_array().ok_or_else(|| self.cast_error("array"))
    }

    /// The inline-table payload, or a `cast` error naming the actual
    /// type.
    pub fn try_table(&self) -> Result<&Table, ParseError> {
        self.as_table().ok_or_else(|| self.cast_error("inline table"))
    }

    fn cast_error(&self, wanted: &str) -> ParseError {
        ParseError::new(
            ErrorKind::Cast,
            format!("expected {}, found {}", wanted, self.type_name()),
        )
    }
}
