use serde_json::{json, Map, Value};
use tracing::debug;

use imsto_types::{ContentHash, EntryId};

use crate::codec::{Codec, ImageAttr};
use crate::error::{EntryError, EntryResult};
use crate::lineage::Lineage;
use crate::policy::EntryPolicy;

const DEFAULT_MIME: &str = "application/octet-stream";

/// The canonical record for one submitted piece of content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    lineage: Lineage,
    attr: ImageAttr,
    size: u64,
    mime: String,
    path: String,
}

impl Entry {
    /// Canonical id: the id of the stored bytes.
    pub fn id(&self) -> &EntryId {
        &self.lineage.canonical().id
    }

    pub fn hash(&self) -> &ContentHash {
        &self.lineage.canonical().hash
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn attr(&self) -> &ImageAttr {
        &self.attr
    }

    /// Byte size of the stored representation.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Shard path of the canonical id plus the format extension.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Metadata to persist next to the stored object.
    pub fn to_meta(&self) -> Map<String, Value> {
        let join = |items: Vec<String>| items.join(",");
        let mut meta = Map::new();
        meta.insert("id".into(), json!(self.id().as_str()));
        meta.insert("path".into(), json!(self.path));
        meta.insert(
            "hashes".into(),
            json!(join(self.lineage.hashes().iter().map(|h| h.to_string()).collect())),
        );
        meta.insert(
            "ids".into(),
            json!(join(self.lineage.ids().iter().map(|i| i.to_string()).collect())),
        );
        meta.insert("size".into(), json!(self.size));
        meta.insert("mime".into(), json!(self.mime));
        meta.insert("width".into(), json!(self.attr.width));
        meta.insert("height".into(), json!(self.attr.height));
        meta.insert("format".into(), json!(self.attr.format.name()));
        if let Some(q) = self.attr.quality {
            meta.insert("quality".into(), json!(q));
        }
        meta
    }
}

/// An [`Entry`] together with the bytes to store for it.
#[derive(Clone, Debug)]
pub struct BuiltEntry {
    pub entry: Entry,
    pub data: Vec<u8>,
}

/// Builds entries from raw submissions. Performs no I/O.
pub struct EntryBuilder<'a> {
    codec: &'a dyn Codec,
    policy: EntryPolicy,
}

impl<'a> EntryBuilder<'a> {
    pub fn new(codec: &'a dyn Codec) -> Self {
        Self {
            codec,
            policy: EntryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EntryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &EntryPolicy {
        &self.policy
    }

    /// Build the entry for `raw`.
    pub fn build(&self, raw: &[u8]) -> EntryResult<BuiltEntry> {
        self.policy.check_size(raw.len())?;

        let raw_hash = ContentHash::compute(raw);
        let mut attr = self.codec.decode(raw).map_err(EntryError::Decode)?;
        self.policy.check_dimensions(&attr)?;

        let opts = self.policy.write_options(&attr);
        let normalized = match &opts {
            Some(opts) => Some(self.codec.encode(raw, opts).map_err(EntryError::Encode)?),
            None => None,
        };
        let normalized_hash = normalized
            .as_deref()
            .map(ContentHash::compute)
            .unwrap_or_else(|| raw_hash.clone());

        let lineage = Lineage::from_digests(raw_hash, normalized_hash)?;
        let data = match (lineage.is_normalized(), normalized) {
            (true, Some(bytes)) => {
                if let Some(opts) = opts {
                    attr.quality = opts.quality;
                }
                bytes
            }
            _ => raw.to_vec(),
        };

        let ext = attr.format.ext();
        let path = format!("{}{}", lineage.canonical().id.shard_path(), ext);
        let mime = mime_guess::from_ext(ext.trim_start_matches('.'))
            .first_raw()
            .unwrap_or(DEFAULT_MIME)
            .to_string();

        debug!(
            id = %lineage.canonical().id,
            normalized = lineage.is_normalized(),
            size = data.len(),
            %mime,
            "entry built"
        );

        let entry = Entry {
            lineage,
            attr,
            size: data.len() as u64,
            mime,
            path,
        };
        Ok(BuiltEntry { entry, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, CodecResult, ImageFormat, WriteOptions};
    use crate::sniff::{tests::png, SniffCodec};

    /// Accepts anything starting with `IMG`; normalizing trims trailing
    /// spaces and newlines.
    struct TrimCodec;

    impl Codec for TrimCodec {
        fn decode(&self, raw: &[u8]) -> CodecResult<ImageAttr> {
            if !raw.starts_with(b"IMG") {
                return Err(CodecError::Unsupported("not an IMG".into()));
            }
            Ok(ImageAttr {
                width: 100,
                height: 100,
                format: ImageFormat::Jpeg,
                quality: Some(95),
            })
        }

        fn encode(&self, raw: &[u8], _opts: &WriteOptions) -> CodecResult<Vec<u8>> {
            let end = raw
                .iter()
                .rposition(|b| *b != b' ' && *b != b'\n')
                .map_or(0, |i| i + 1);
            Ok(raw[..end].to_vec())
        }
    }

    #[test]
    fn canonical_content_single_revision() {
        let built = EntryBuilder::new(&TrimCodec).build(b"IMG-B").unwrap();
        let entry = &built.entry;
        let expected = EntryId::from_hash(&ContentHash::compute(b"IMG-B")).unwrap();
        assert_eq!(entry.id(), &expected);
        assert_eq!(entry.lineage().revisions().len(), 1);
        assert_eq!(built.data, b"IMG-B");
        assert_eq!(entry.size(), 5);
        // quality untouched when nothing changed
        assert_eq!(entry.attr().quality, Some(95));
    }

    #[test]
    fn normalized_content_two_revisions() {
        let built = EntryBuilder::new(&TrimCodec).build(b"IMG-A  \n").unwrap();
        let entry = &built.entry;
        let revs = entry.lineage().revisions();
        assert_eq!(revs.len(), 2);
        assert_eq!(revs[0].hash, ContentHash::compute(b"IMG-A  \n"));
        assert_eq!(revs[1].hash, ContentHash::compute(b"IMG-A"));
        assert_eq!(entry.id(), &revs[1].id);
        assert_eq!(built.data, b"IMG-A");
        assert_eq!(entry.size(), 5);
        assert_eq!(entry.attr().quality, Some(88));
    }

    #[test]
    fn different_uploads_dedupe_to_one_id() {
        let builder = EntryBuilder::new(&TrimCodec);
        let a = builder.build(b"IMG-A  ").unwrap();
        let b = builder.build(b"IMG-A\n\n").unwrap();
        assert_ne!(a.entry.lineage().raw(), b.entry.lineage().raw());
        assert_eq!(a.entry.id(), b.entry.id());
        assert_eq!(a.entry.path(), b.entry.path());
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn path_and_mime_from_extension() {
        let built = EntryBuilder::new(&TrimCodec).build(b"IMG-C").unwrap();
        let entry = built.entry;
        assert!(entry.path().ends_with(".jpg"));
        assert!(entry.path().starts_with(&entry.id().shard_path()));
        assert_eq!(entry.mime(), "image/jpeg");
    }

    #[test]
    fn decode_failure_aborts() {
        let err = EntryBuilder::new(&TrimCodec).build(b"ABC").unwrap_err();
        assert!(matches!(err, EntryError::Decode(_)));
    }

    #[test]
    fn policy_rejections() {
        let policy = EntryPolicy {
            max_file_size: 4,
            ..EntryPolicy::default()
        };
        let err = EntryBuilder::new(&TrimCodec)
            .with_policy(policy)
            .build(b"IMG-LONG")
            .unwrap_err();
        assert!(matches!(err, EntryError::TooLarge { size: 8, max: 4 }));

        let policy = EntryPolicy {
            min_width: 200,
            ..EntryPolicy::default()
        };
        let err = EntryBuilder::new(&TrimCodec)
            .with_policy(policy)
            .build(b"IMG-X")
            .unwrap_err();
        assert!(matches!(err, EntryError::Dimensions { width: 100, .. }));
    }

    #[test]
    fn normalization_disabled_keeps_raw() {
        let built = EntryBuilder::new(&TrimCodec)
            .with_policy(EntryPolicy::permissive())
            .build(b"IMG-A  ")
            .unwrap();
        assert!(!built.entry.lineage().is_normalized());
        assert_eq!(built.data, b"IMG-A  ");
    }

    #[test]
    fn sniffed_png_entry() {
        let raw = png(320, 200);
        let built = EntryBuilder::new(&SniffCodec).build(&raw).unwrap();
        assert_eq!(built.data, raw);
        assert!(built.entry.path().ends_with(".png"));
        assert_eq!(built.entry.mime(), "image/png");
        assert_eq!(built.entry.attr().width, 320);
    }

    #[test]
    fn meta_lists_history() {
        let built = EntryBuilder::new(&TrimCodec).build(b"IMG-A \n").unwrap();
        let meta = built.entry.to_meta();
        let hashes = meta["hashes"].as_str().unwrap();
        assert_eq!(hashes.split(',').count(), 2);
        assert_eq!(meta["id"], json!(built.entry.id().as_str()));
        assert_eq!(meta["size"], json!(5));
        assert_eq!(meta["format"], json!("jpeg"));
        assert_eq!(meta["quality"], json!(88));
    }
}
