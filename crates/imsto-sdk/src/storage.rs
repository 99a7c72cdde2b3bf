use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use imsto_config::Config;
use imsto_entry::{Codec, EntryBuilder, EntryPolicy};
use imsto_store::{EngineRegistry, ListItem, ListSpec, Meta, Wagon};
use imsto_types::{EntryId, SEPARATOR};
use tracing::{debug, info, warn};

use crate::error::{SdkError, SdkResult};
use crate::stored::StoredEntry;

/// Namespace-aware object store.
///
/// Each roof is resolved to its engine on first use and the engine is kept
/// for the lifetime of the `Storage`. Safe to share across threads.
pub struct Storage {
    registry: EngineRegistry,
    config: Arc<dyn Config>,
    codec: Arc<dyn Codec>,
    wagons: RwLock<HashMap<String, Arc<dyn Wagon>>>,
}

impl Storage {
    pub fn new(
        registry: EngineRegistry,
        config: impl Config + 'static,
        codec: impl Codec + 'static,
    ) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            codec: Arc::new(codec),
            wagons: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn config(&self) -> &dyn Config {
        self.config.as_ref()
    }

    // ---- Engine resolution ----

    /// Engine bound to `roof`, resolved once and cached.
    pub fn wagon(&self, roof: &str) -> SdkResult<Arc<dyn Wagon>> {
        let roof = check_roof(roof)?;
        if let Some(wagon) = self.wagons.read().map_err(poisoned)?.get(roof) {
            return Ok(Arc::clone(wagon));
        }

        let mut wagons = self.wagons.write().map_err(poisoned)?;
        if let Some(wagon) = wagons.get(roof) {
            return Ok(Arc::clone(wagon));
        }
        let wagon = self.registry.resolve(roof, self.config.as_ref())?;
        debug!(roof, engine = wagon.name(), "engine cached");
        wagons.insert(roof.to_string(), Arc::clone(&wagon));
        Ok(wagon)
    }

    // ---- Content operations ----

    /// Build the entry for `raw` and persist it under `roof`.
    ///
    /// When the canonical key is already present the write is skipped and
    /// the recorded metadata is returned. An object whose metadata is
    /// missing is treated as an incomplete write and rewritten.
    pub fn store(&self, roof: &str, raw: &[u8]) -> SdkResult<StoredEntry> {
        let wagon = self.wagon(roof)?;
        let policy = EntryPolicy::from_config(self.config.as_ref(), roof);
        let built = EntryBuilder::new(self.codec.as_ref())
            .with_policy(policy)
            .build(raw)?;
        let key = built.entry.path().to_string();

        if wagon.exists(&key)? {
            match wagon.meta(&key) {
                Ok(meta) => {
                    debug!(roof, %key, "duplicate content, write skipped");
                    return Ok(StoredEntry {
                        entry: built.entry,
                        meta,
                        deduplicated: true,
                    });
                }
                Err(e) if e.is_not_found() => {
                    warn!(roof, %key, "object without metadata, rewriting");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let meta = wagon.put(&key, &built.data, &Meta::from(built.entry.to_meta()))?;
        info!(roof, id = %built.entry.id(), %key, size = built.data.len(), "entry stored");
        Ok(StoredEntry {
            entry: built.entry,
            meta,
            deduplicated: false,
        })
    }

    /// Bytes stored under a storage key or entry id.
    pub fn fetch(&self, roof: &str, key_or_id: &str) -> SdkResult<Vec<u8>> {
        let wagon = self.wagon(roof)?;
        let key = self
            .storage_key(wagon.as_ref(), key_or_id)?
            .ok_or_else(|| SdkError::NotFound(key_or_id.to_string()))?;
        Ok(wagon.get(&key)?)
    }

    /// Engine metadata recorded for a storage key or entry id.
    pub fn meta(&self, roof: &str, key_or_id: &str) -> SdkResult<Meta> {
        let wagon = self.wagon(roof)?;
        let key = self
            .storage_key(wagon.as_ref(), key_or_id)?
            .ok_or_else(|| SdkError::NotFound(key_or_id.to_string()))?;
        Ok(wagon.meta(&key)?)
    }

    /// Storage key holding `id`, whatever its extension.
    pub fn locate(&self, roof: &str, id: &EntryId) -> SdkResult<Option<String>> {
        let wagon = self.wagon(roof)?;
        locate_in(wagon.as_ref(), id)
    }

    pub fn exists(&self, roof: &str, key_or_id: &str) -> SdkResult<bool> {
        let wagon = self.wagon(roof)?;
        match self.storage_key(wagon.as_ref(), key_or_id)? {
            Some(key) => Ok(wagon.exists(&key)?),
            None => Ok(false),
        }
    }

    pub fn delete(&self, roof: &str, key_or_id: &str) -> SdkResult<()> {
        let wagon = self.wagon(roof)?;
        let key = self
            .storage_key(wagon.as_ref(), key_or_id)?
            .ok_or_else(|| SdkError::NotFound(key_or_id.to_string()))?;
        wagon.delete(&key)?;
        info!(roof, %key, "entry deleted");
        Ok(())
    }

    pub fn list(&self, roof: &str, spec: &ListSpec) -> SdkResult<Vec<ListItem>> {
        Ok(self.wagon(roof)?.list(spec)?)
    }

    /// Map a caller-supplied name to a storage key.
    ///
    /// Sharded keys pass through. `id.ext` maps straight to its path. A bare
    /// id is looked up by listing its shard directory.
    fn storage_key(&self, wagon: &dyn Wagon, key_or_id: &str) -> SdkResult<Option<String>> {
        let key_or_id = key_or_id.trim();
        if key_or_id.is_empty() {
            return Err(SdkError::EmptyId);
        }
        if key_or_id.contains(SEPARATOR) {
            return Ok(Some(key_or_id.to_string()));
        }
        match key_or_id.split_once('.') {
            Some((stem, ext)) => {
                let id = EntryId::parse(stem)?;
                Ok(Some(format!("{}.{ext}", id.shard_path())))
            }
            None => locate_in(wagon, &EntryId::parse(key_or_id)?),
        }
    }
}

fn locate_in(wagon: &dyn Wagon, id: &EntryId) -> SdkResult<Option<String>> {
    let stem = id.shard_path();
    let items = wagon.list(&ListSpec::new().prefix(stem.clone()).keys_only())?;
    Ok(items
        .into_iter()
        .filter(|item| !item.is_prefix)
        .map(|item| item.key)
        .find(|key| has_stem(key, &stem)))
}

/// `key` is `stem` itself or `stem` plus a dotted extension.
fn has_stem(key: &str, stem: &str) -> bool {
    match key.strip_prefix(stem) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') && !rest.contains(SEPARATOR),
        None => false,
    }
}

fn check_roof(roof: &str) -> SdkResult<&str> {
    let roof = roof.trim();
    if roof.is_empty() {
        return Err(SdkError::EmptyRoof);
    }
    Ok(roof)
}

fn poisoned<T>(e: PoisonError<T>) -> SdkError {
    SdkError::Internal(format!("engine cache lock poisoned: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imsto_config::StoreConfig;
    use imsto_entry::{CodecError, CodecResult, ImageAttr, ImageFormat, SniffCodec, WriteOptions};
    use imsto_store::RegistryError;

    const ABC_ID: &str = "8jawfxm0tgixyr5f2mmzi1tf6";
    const ABC_KEY: &str = "8j/aw/fxm0tgixyr5f2mmzi1tf6.png";

    /// Treats any non-empty input as a 100x100 PNG; normalizing trims
    /// trailing spaces and newlines.
    struct TrimCodec;

    impl Codec for TrimCodec {
        fn decode(&self, raw: &[u8]) -> CodecResult<ImageAttr> {
            if raw.is_empty() {
                return Err(CodecError::Unsupported("empty".into()));
            }
            Ok(ImageAttr {
                width: 100,
                height: 100,
                format: ImageFormat::Png,
                quality: None,
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

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
        v.extend_from_slice(&13u32.to_be_bytes());
        v.extend_from_slice(b"IHDR");
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&[8, 6, 0, 0, 0]);
        v
    }

    fn memory_storage() -> Storage {
        let config = StoreConfig::from_toml_str("[demo]\nengine = \"memory\"\n").unwrap();
        Storage::new(EngineRegistry::with_builtin().unwrap(), config, TrimCodec)
    }

    #[test]
    fn store_fetch_exists_delete() {
        let storage = memory_storage();
        let stored = storage.store("demo", b"ABC").unwrap();
        assert_eq!(stored.entry.id().as_str(), ABC_ID);
        assert_eq!(stored.key(), ABC_KEY);
        assert!(!stored.deduplicated);
        assert_eq!(stored.meta.engine(), Some("memory"));

        assert_eq!(storage.fetch("demo", ABC_ID).unwrap(), b"ABC");
        assert!(storage.exists("demo", ABC_ID).unwrap());

        storage.delete("demo", ABC_ID).unwrap();
        assert!(storage.fetch("demo", ABC_ID).unwrap_err().is_not_found());
        assert!(!storage.exists("demo", ABC_ID).unwrap());
    }

    #[test]
    fn normalized_variants_share_identity() {
        let storage = memory_storage();
        let first = storage.store("demo", b"ABC  ").unwrap();
        let second = storage.store("demo", b"ABC\n").unwrap();

        assert_eq!(first.entry.id(), second.entry.id());
        assert_eq!(first.key(), second.key());
        assert_eq!(first.entry.id().as_str(), ABC_ID);
        assert_eq!(first.entry.lineage().revisions().len(), 2);
        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(storage.fetch("demo", ABC_ID).unwrap(), b"ABC");
        assert_eq!(storage.list("demo", &ListSpec::new()).unwrap().len(), 1);
    }

    #[test]
    fn exists_never_written() {
        let storage = memory_storage();
        assert!(!storage.exists("demo", "neverwritten123").unwrap());
    }

    #[test]
    fn fetch_by_key_and_extension() {
        let storage = memory_storage();
        storage.store("demo", b"ABC").unwrap();
        assert_eq!(storage.fetch("demo", ABC_KEY).unwrap(), b"ABC");
        assert_eq!(storage.fetch("demo", &format!("{ABC_ID}.png")).unwrap(), b"ABC");
        assert!(storage.fetch("demo", &format!("{ABC_ID}.jpg")).is_err());
        assert_eq!(
            storage.locate("demo", &EntryId::parse(ABC_ID).unwrap()).unwrap(),
            Some(ABC_KEY.to_string())
        );
    }

    #[test]
    fn engine_is_cached_per_roof() {
        let storage = memory_storage();
        let a = storage.wagon("demo").unwrap();
        let b = storage.wagon(" demo ").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unconfigured_roof() {
        let storage = memory_storage();
        assert!(matches!(
            storage.store("missing", b"ABC"),
            Err(SdkError::Registry(RegistryError::UnconfiguredNamespace(_)))
        ));
    }

    #[test]
    fn delete_validates_input() {
        let storage = memory_storage();
        assert!(matches!(storage.delete("", ABC_ID), Err(SdkError::EmptyRoof)));
        assert!(matches!(storage.delete("demo", " "), Err(SdkError::EmptyId)));
        assert!(matches!(storage.delete("demo", "not-base36!"), Err(SdkError::Id(_))));
        assert!(storage.delete("demo", ABC_ID).unwrap_err().is_not_found());
    }

    #[test]
    fn rejected_entry_stores_nothing() {
        let config = StoreConfig::from_toml_str("[demo]\nengine = \"memory\"\n").unwrap();
        let storage = Storage::new(EngineRegistry::with_builtin().unwrap(), config, SniffCodec);
        assert!(matches!(
            storage.store("demo", &png(10, 10)),
            Err(SdkError::Entry(_))
        ));
        assert!(storage.list("demo", &ListSpec::new()).unwrap().is_empty());
    }

    #[test]
    fn file_engine_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            "[common]\nlocal_root = {:?}\n[demo]\nengine = \"file\"\n",
            dir.path().display().to_string()
        );
        let config = StoreConfig::from_toml_str(&text).unwrap();
        let storage = Storage::new(EngineRegistry::with_builtin().unwrap(), config, SniffCodec);

        let image = png(64, 64);
        let stored = storage.store("demo", &image).unwrap();
        assert!(stored.key().ends_with(".png"));
        assert!(dir.path().join(stored.key()).is_file());

        let meta = storage.meta("demo", stored.entry.id().as_str()).unwrap();
        assert_eq!(meta.engine(), Some("file"));
        assert_eq!(meta.get_str("mime"), Some("image/png"));
        assert_eq!(meta.size(), Some(image.len() as u64));

        let again = storage.store("demo", &image).unwrap();
        assert!(again.deduplicated);
        assert_eq!(again.meta, meta);

        let id = stored.entry.id().to_string();
        assert_eq!(storage.fetch("demo", &id).unwrap(), image);
        storage.delete("demo", &id).unwrap();
        assert!(!storage.exists("demo", &id).unwrap());
    }

    #[test]
    fn missing_sidecar_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            "[common]\nlocal_root = {:?}\n[demo]\nengine = \"file\"\n",
            dir.path().display().to_string()
        );
        let config = StoreConfig::from_toml_str(&text).unwrap();
        let storage = Storage::new(EngineRegistry::with_builtin().unwrap(), config, SniffCodec);

        let image = png(32, 16);
        let stored = storage.store("demo", &image).unwrap();
        let sidecar = dir.path().join(format!("{}.meta", stored.key()));
        std::fs::remove_file(&sidecar).unwrap();
        assert!(dir.path().join(stored.key()).is_file());

        let again = storage.store("demo", &image).unwrap();
        assert!(!again.deduplicated);
        assert!(sidecar.is_file());
        assert_eq!(again.meta.get_str("mime"), Some("image/png"));
    }

    #[test]
    fn stem_matching() {
        assert!(has_stem("ab/cd/efgh", "ab/cd/efgh"));
        assert!(has_stem("ab/cd/efgh.png", "ab/cd/efgh"));
        assert!(!has_stem("ab/cd/efghi.png", "ab/cd/efgh"));
        assert!(!has_stem("ab/cd/efgh.d/x", "ab/cd/efgh"));
    }
}
