//! Parser configuration
//!
//! All input limits are construction-time options rather than
//! compile-time constants. Exceeding any of them during a parse is a
//! [`BufferOverflow`](crate::ErrorKind::BufferOverflow) error.

use serde::{Deserialize, Serialize};

/// Default maximum input size: 1 GiB.
pub const DEFAULT_MAX_INPUT_LEN: usize = 1 << 30;
/// Default maximum bytes per key segment.
pub const DEFAULT_MAX_KEY_LEN: usize = 256;
/// Default maximum bytes per string value.
pub const DEFAULT_MAX_STRING_LEN: usize = 4096;
/// Default maximum children per table.
pub const DEFAULT_MAX_TABLE_ENTRIES: usize = 131_072;
/// Default maximum elements per array.
pub const DEFAULT_MAX_ARRAY_LEN: usize = 131_072;

/// Input limits for a parse.
///
/// ```rust
/// use tomlet::ParserOptions;
///
/// let options = ParserOptions::default().with_max_string_len(64);
/// assert_eq!(options.max_string_len, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Maximum total input size in bytes.
    pub max_input_len: usize,
    /// Maximum bytes per key segment.
    pub max_key_len: usize,
    /// Maximum bytes per string value.
    pub max_string_len: usize,
    /// Maximum children per table, inline tables included.
    pub max_table_entries: usize,
    /// Maximum elements per array, arrays of tables included.
    pub max_array_len: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_table_entries: DEFAULT_MAX_TABLE_ENTRIES,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
        }
    }
}

impl ParserOptions {
    /// Set the maximum total input size in bytes.
    pub fn with_max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = len;
        self
    }

    /// Set the maximum bytes per key segment.
    pub fn with_max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = len;
        self
    }

    /// Set the maximum bytes per string value.
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Set the maximum children per table.
    pub fn with_max_table_entries(mut self, len: usize) -> Self {
        self.max_table_entries = len;
        self
    }

    /// Set the maximum elements per array.
    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }
}
