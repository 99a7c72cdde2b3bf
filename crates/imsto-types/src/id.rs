use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::IdCodec;
use crate::error::{IdError, IdResult};
use crate::hash::ContentHash;
use crate::shard::shard_path;

/// Externally visible identifier of a stored entry.
///
/// An `EntryId` pairs the base-36 id string with the [`ContentHash`] it was
/// derived from. The id string is always in canonical form: lowercase with no
/// leading zeros, so one hash maps to exactly one id and one storage path.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId {
    id: String,
    hash: ContentHash,
}

impl EntryId {
    /// Derive the id for a content hash.
    pub fn from_hash(hash: &ContentHash) -> IdResult<Self> {
        let id = IdCodec::MD5.encode(hash.as_str())?;
        Ok(Self {
            id,
            hash: hash.clone(),
        })
    }

    /// Parse a base-36 id string, recovering its content hash.
    pub fn parse(s: &str) -> IdResult<Self> {
        let hex = IdCodec::MD5.decode(s)?;
        let hash = ContentHash::parse(&hex)?;
        let trimmed = s.trim_start_matches('0');
        let id = if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_ascii_lowercase()
        };
        Ok(Self { id, hash })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Sharded storage key for this id, without extension.
    pub fn shard_path(&self) -> String {
        shard_path(&self.id)
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.id)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl std::str::FromStr for EntryId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntryId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.id
    }
}
