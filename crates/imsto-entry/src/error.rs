use imsto_types::IdError;

use crate::codec::CodecError;

/// Errors from building an entry. No partial entry is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// The codec could not decode the submitted bytes.
    #[error("decode failed: {0}")]
    Decode(#[source] CodecError),

    /// The codec could not produce the normalized representation.
    #[error("normalize failed: {0}")]
    Encode(#[source] CodecError),

    #[error("content too large: {size} bytes exceeds {max}")]
    TooLarge { size: usize, max: usize },

    #[error("image {width}x{height} rejected: {reason}")]
    Dimensions {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error(transparent)]
    Id(#[from] IdError),
}

/// Result alias for entry construction.
pub type EntryResult<T> = Result<T, EntryError>;
