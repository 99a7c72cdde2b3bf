//! Contract for the image codec collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Image container formats the store accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    /// File extension, including the leading dot.
    pub fn ext(&self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Gif => ".gif",
            Self::Webp => ".webp",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Parse a format name or extension (`jpg`, `.jpeg`, `PNG`, ...).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attributes reported by [`Codec::decode`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttr {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// Compression quality, when the format has one and it is detectable.
    pub quality: Option<u8>,
}

/// Target of a re-encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    pub format: ImageFormat,
    pub quality: Option<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported content: {0}")]
    Unsupported(String),

    #[error("malformed {format} data: {reason}")]
    Malformed {
        format: ImageFormat,
        reason: &'static str,
    },

    #[error("encode error: {0}")]
    Encode(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Image decoding and re-encoding.
///
/// Implementations hold no per-call state and may be shared across threads.
pub trait Codec: Send + Sync {
    /// Inspect `raw` and report its attributes.
    fn decode(&self, raw: &[u8]) -> CodecResult<ImageAttr>;

    /// Re-encode `raw` with the given options.
    fn encode(&self, raw: &[u8], opts: &WriteOptions) -> CodecResult<Vec<u8>>;
}
