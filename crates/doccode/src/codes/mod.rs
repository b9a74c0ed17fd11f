//! Code space: a bijection between integer indices and five-letter codes.
//!
//! Codes are written in base 25 over the alphabet `A`-`Z` without `W`, most
//! significant symbol first. Index 0 is `AAAAA`, index 25 is `AAABA`, and the
//! last index, `25^5 - 1`, is `ZZZZZ`.

pub mod allocator;
pub mod error;
pub mod filename;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use allocator::{AllocatedCode, AllocationError, CodeAllocator, CodeOrigin};
pub use error::CodeError;
pub use filename::{
    append_code_to_filename, extract_code_from_filename, has_code_suffix,
    strip_code_from_filename, SEPARATOR,
};

/// The 25 symbols codes are built from, in digit order.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVXYZ";

const ALPHABET_BYTES: &[u8; 25] = b"ABCDEFGHIJKLMNOPQRSTUVXYZ";

pub const BASE: u32 = 25;
pub const CODE_LENGTH: usize = 5;

/// Number of distinct codes: `25^5 = 9_765_625`.
pub const CAPACITY: u32 = BASE.pow(CODE_LENGTH as u32);

/// A validated five-letter document code.
///
/// Construction always validates, so holding a `Code` means the value is
/// five symbols from [`ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Validates and wraps a code string.
    pub fn new(code: impl Into<String>) -> Result<Self, CodeError> {
        let code = code.into();
        if is_valid_code(&code) {
            Ok(Self(code))
        } else {
            Err(CodeError::InvalidCode(code))
        }
    }

    /// Encodes an index. Same as [`index_to_code`].
    pub fn from_index(index: i64) -> Result<Self, CodeError> {
        index_to_code(index)
    }

    /// Position of this code in the code space.
    pub fn index(&self) -> u32 {
        self.0
            .bytes()
            .filter_map(symbol_value)
            .fold(0, |acc, digit| acc * BASE + digit)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Digit value of an alphabet symbol, `None` for anything else
/// (lowercase, `W`, punctuation, non-ASCII bytes).
fn symbol_value(symbol: u8) -> Option<u32> {
    match symbol {
        b'A'..=b'V' => Some(u32::from(symbol - b'A')),
        b'X'..=b'Z' => Some(u32::from(symbol - b'A') - 1),
        _ => None,
    }
}

/// Converts an index in `[0, 25^5)` to its code.
pub fn index_to_code(index: i64) -> Result<Code, CodeError> {
    if index >= i64::from(CAPACITY) {
        return Err(CodeError::RegistryExhausted {
            index,
            max_index: CAPACITY - 1,
        });
    }
    if index < 0 {
        return Err(CodeError::InvalidIndex(index));
    }

    // Least significant digit lands in the last slot.
    let mut remaining = index as u32;
    let mut symbols = [b'A'; CODE_LENGTH];
    for slot in symbols.iter_mut().rev() {
        *slot = ALPHABET_BYTES[(remaining % BASE) as usize];
        remaining /= BASE;
    }

    Ok(Code(symbols.iter().map(|&b| char::from(b)).collect()))
}

/// Converts a code string back to its index.
pub fn code_to_index(code: &str) -> Result<u32, CodeError> {
    Code::new(code).map(|c| c.index())
}

/// Returns true if `code` is exactly five symbols from [`ALPHABET`].
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| symbol_value(b).is_some())
}

/// Up to `count` consecutive codes starting at `start`; stops early at the
/// end of the code space.
pub fn code_range(start: u32, count: usize) -> Vec<Code> {
    (start..CAPACITY)
        .take(count)
        .map_while(|index| index_to_code(i64::from(index)).ok())
        .collect()
}

/// Static facts about the code space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSpaceStats {
    pub alphabet: &'static str,
    pub alphabet_size: u32,
    pub code_length: usize,
    pub total_capacity: u32,
}

pub fn code_space_stats() -> CodeSpaceStats {
    CodeSpaceStats {
        alphabet: ALPHABET,
        alphabet_size: BASE,
        code_length: CODE_LENGTH,
        total_capacity: CAPACITY,
    }
}
