use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::{IdError, IdResult};

/// MD5 digest of a byte sequence, rendered as 32 lowercase hex characters.
///
/// Identical bytes always produce the same `ContentHash`, which is what makes
/// stored objects deduplicatable.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Number of hex characters in a digest.
    pub const HEX_LEN: usize = 32;

    /// Digest raw bytes.
    pub fn compute(data: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(data)))
    }

    /// Parse a hex digest. Upper-case input is accepted and normalized.
    pub fn parse(s: &str) -> IdResult<Self> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.len() != Self::HEX_LEN {
            return Err(IdError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidDigits {
                input: s.to_string(),
                radix: 16,
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
