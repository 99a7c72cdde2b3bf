use thiserror::Error;

/// Errors produced by identifier and hash parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid base-{radix} digits in {input:?}")]
    InvalidDigits { input: String, radix: u32 },

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("empty identifier")]
    Empty,
}

/// Result alias for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
