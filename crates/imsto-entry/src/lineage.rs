use serde::{Deserialize, Serialize};

use imsto_types::{ContentHash, EntryId, IdResult};

/// One `(hash, id)` pair in an entry's content history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub hash: ContentHash,
    pub id: EntryId,
}

impl Revision {
    pub fn from_hash(hash: ContentHash) -> IdResult<Self> {
        let id = EntryId::from_hash(&hash)?;
        Ok(Self { hash, id })
    }
}

/// Content history of an entry.
///
/// The transition is decided solely by comparing the raw and normalized
/// digests: equal digests mean the submission was already canonical.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lineage {
    /// Stored bytes are the submitted bytes.
    RawOnly(Revision),
    /// Stored bytes are the normalized bytes; `normalized` is canonical.
    RawAndNormalized {
        raw: Revision,
        normalized: Revision,
    },
}

impl Lineage {
    pub fn from_digests(raw: ContentHash, normalized: ContentHash) -> IdResult<Self> {
        if raw == normalized {
            return Ok(Self::RawOnly(Revision::from_hash(raw)?));
        }
        Ok(Self::RawAndNormalized {
            raw: Revision::from_hash(raw)?,
            normalized: Revision::from_hash(normalized)?,
        })
    }

    /// The revision that is actually stored.
    pub fn canonical(&self) -> &Revision {
        match self {
            Self::RawOnly(rev) => rev,
            Self::RawAndNormalized { normalized, .. } => normalized,
        }
    }

    /// The submitted revision.
    pub fn raw(&self) -> &Revision {
        match self {
            Self::RawOnly(rev) => rev,
            Self::RawAndNormalized { raw, .. } => raw,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, Self::RawAndNormalized { .. })
    }

    /// Revisions in order: raw first, canonical last.
    pub fn revisions(&self) -> Vec<&Revision> {
        match self {
            Self::RawOnly(rev) => vec![rev],
            Self::RawAndNormalized { raw, normalized } => vec![raw, normalized],
        }
    }

    pub fn hashes(&self) -> Vec<&ContentHash> {
        self.revisions().into_iter().map(|r| &r.hash).collect()
    }

    pub fn ids(&self) -> Vec<&EntryId> {
        self.revisions().into_iter().map(|r| &r.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_digests_stay_raw() {
        let h = ContentHash::compute(b"same");
        let lineage = Lineage::from_digests(h.clone(), h.clone()).unwrap();
        assert!(!lineage.is_normalized());
        assert_eq!(lineage.revisions().len(), 1);
        assert_eq!(lineage.canonical().hash, h);
        assert_eq!(lineage.raw(), lineage.canonical());
    }

    #[test]
    fn different_digests_order_raw_then_normalized() {
        let raw = ContentHash::compute(b"raw");
        let norm = ContentHash::compute(b"norm");
        let lineage = Lineage::from_digests(raw.clone(), norm.clone()).unwrap();
        assert!(lineage.is_normalized());
        assert_eq!(lineage.hashes(), vec![&raw, &norm]);
        assert_eq!(lineage.canonical().hash, norm);
        assert_eq!(lineage.canonical().id, EntryId::from_hash(&norm).unwrap());
        let ids = lineage.ids();
        assert_ne!(ids[0], ids[1]);
    }
}
