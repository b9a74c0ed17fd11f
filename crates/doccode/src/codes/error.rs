//! Code space error types.

use thiserror::Error;

/// Errors from encoding, decoding or validating codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The index lies past the last code the alphabet can express.
    #[error("Registry exhausted: index {index} exceeds maximum {max_index}. No more unique codes available")]
    RegistryExhausted { index: i64, max_index: u32 },

    /// Negative indices have no code.
    #[error("Index must be non-negative, got {0}")]
    InvalidIndex(i64),

    /// The string is not five uppercase letters from the code alphabet.
    #[error("Invalid code format '{0}': must be 5 uppercase letters from A-Z excluding W")]
    InvalidCode(String),
}
