use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use imsto_config::Config;
use imsto_types::ContentHash;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::storage_key;
use crate::list::{ListItem, ListSpec};
use crate::meta::Meta;
use crate::traits::Wagon;

/// Registered name of the in-memory engine.
pub const ENGINE_NAME: &str = "memory";

#[derive(Clone, Debug)]
struct Slot {
    data: Vec<u8>,
    meta: Meta,
    modified: DateTime<Utc>,
}

/// In-memory, `BTreeMap`-based storage engine.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock` and
/// cloned on read and write. Data is lost when the engine is dropped.
pub struct InMemoryWagon {
    objects: RwLock<BTreeMap<String, Slot>>,
}

impl InMemoryWagon {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registry constructor; the engine takes no settings.
    pub fn from_config(_roof: &str, _config: &dyn Config) -> StoreResult<Self> {
        Ok(Self::new())
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns `true` if the engine holds no objects.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        Ok(self.read()?.values().map(|s| s.data.len() as u64).sum())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, Slot>>> {
        self.objects
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, Slot>>> {
        self.objects
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for InMemoryWagon {
    fn default() -> Self {
        Self::new()
    }
}

impl Wagon for InMemoryWagon {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn get(&self, id: &str) -> StoreResult<Vec<u8>> {
        let key = storage_key(id)?;
        self.read()?
            .get(&key)
            .map(|slot| slot.data.clone())
            .ok_or(StoreError::NotFound(key))
    }

    fn put(&self, id: &str, data: &[u8], meta: &Meta) -> StoreResult<Meta> {
        let key = storage_key(id)?;
        let stored = meta.stamped(ENGINE_NAME, &key, data.len());
        let slot = Slot {
            data: data.to_vec(),
            meta: stored.clone(),
            modified: Utc::now(),
        };
        self.write()?.insert(key.clone(), slot);
        debug!(%key, size = data.len(), "memory put");
        Ok(stored)
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        let key = storage_key(id)?;
        Ok(self.read()?.contains_key(&key))
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let key = storage_key(id)?;
        match self.write()?.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(key)),
        }
    }

    fn list(&self, spec: &ListSpec) -> StoreResult<Vec<ListItem>> {
        let objects = self.read()?;
        let items = objects
            .iter()
            .filter(|(key, _)| spec.admits(key))
            .map(|(key, slot)| {
                ListItem::new(key.clone(), String::new(), slot.data.len() as u64, slot.modified)
            })
            .collect();
        let mut page = spec.apply(items);
        if !spec.keys_only {
            for item in page.iter_mut().filter(|item| !item.is_prefix) {
                if let Some(slot) = objects.get(&item.key) {
                    item.etag = ContentHash::compute(&slot.data).to_string();
                }
            }
        }
        Ok(page)
    }

    fn meta(&self, id: &str) -> StoreResult<Meta> {
        let key = storage_key(id)?;
        self.read()?
            .get(&key)
            .map(|slot| slot.meta.clone())
            .ok_or(StoreError::NotFound(key))
    }
}

impl std::fmt::Debug for InMemoryWagon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryWagon")
            .field("object_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const ABC_ID: &str = "8jawfxm0tgixyr5f2mmzi1tf6";

    #[test]
    fn put_get_exists_delete() {
        let wagon = InMemoryWagon::new();
        let stored = wagon.put(ABC_ID, b"ABC", &Meta::new()).unwrap();
        assert_eq!(stored.engine(), Some("memory"));
        assert_eq!(stored.size(), Some(3));

        assert_eq!(wagon.get(ABC_ID).unwrap(), b"ABC");
        assert!(wagon.exists(ABC_ID).unwrap());

        wagon.delete(ABC_ID).unwrap();
        assert!(wagon.get(ABC_ID).unwrap_err().is_not_found());
        assert!(!wagon.exists(ABC_ID).unwrap());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let wagon = InMemoryWagon::new();
        assert!(matches!(
            wagon.delete("neverwritten"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn overwrite_replaces_content_and_meta() {
        let wagon = InMemoryWagon::new();
        let mut first = Meta::new();
        first.insert("rev", 1);
        wagon.put("abcdefgh", b"one", &first).unwrap();
        let mut second = Meta::new();
        second.insert("rev", 2);
        wagon.put("abcdefgh", b"two!", &second).unwrap();

        assert_eq!(wagon.get("abcdefgh").unwrap(), b"two!");
        let meta = wagon.meta("abcdefgh").unwrap();
        assert_eq!(meta.get("rev"), Some(&serde_json::json!(2)));
        assert_eq!(meta.size(), Some(4));
        assert_eq!(wagon.len().unwrap(), 1);
        assert_eq!(wagon.total_bytes().unwrap(), 4);
    }

    #[test]
    fn keys_are_sharded() {
        let wagon = InMemoryWagon::new();
        wagon.put("abcdefgh", b"x", &Meta::new()).unwrap();
        let items = wagon.list(&ListSpec::new()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "ab/cd/efgh");
        assert_eq!(items[0].etag, ContentHash::compute(b"x").to_string());
        // the sharded key addresses the same object
        assert_eq!(wagon.get("ab/cd/efgh").unwrap(), b"x");
    }

    #[test]
    fn list_with_prefix_and_limit() {
        let wagon = InMemoryWagon::new();
        for id in ["aaaa0001", "aaaa0002", "aabb0003", "bbbb0004"] {
            wagon.put(id, id.as_bytes(), &Meta::new()).unwrap();
        }
        let items = wagon.list(&ListSpec::new().prefix("aa/aa/")).unwrap();
        assert_eq!(items.len(), 2);
        let items = wagon.list(&ListSpec::new().limit(3)).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].key, "aa/bb/0003");
    }

    #[test]
    fn keys_only_and_etags() {
        let wagon = InMemoryWagon::new();
        wagon.put(ABC_ID, b"ABC", &Meta::new()).unwrap();
        let items = wagon.list(&ListSpec::new()).unwrap();
        assert_eq!(items[0].etag, ContentHash::compute(b"ABC").to_string());
        let items = wagon.list(&ListSpec::new().keys_only()).unwrap();
        assert!(items[0].etag.is_empty());
    }

    #[test]
    fn concurrent_put_get_exists() {
        let wagon: Arc<dyn Wagon> = Arc::new(InMemoryWagon::new());
        std::thread::scope(|s| {
            for t in 0..8u32 {
                let wagon = Arc::clone(&wagon);
                s.spawn(move || {
                    for n in 0..16u32 {
                        let id = format!("abcd{t:02}{n:02}");
                        let body = id.as_bytes();
                        wagon.put(&id, body, &Meta::new()).unwrap();
                        assert_eq!(wagon.get(&id).unwrap(), body);
                        assert!(wagon.exists(&id).unwrap());
                    }
                });
            }
        });
        let items = wagon.list(&ListSpec::new().limit(1000)).unwrap();
        assert_eq!(items.len(), 8 * 16);
    }

    #[test]
    fn invalid_key_rejected() {
        let wagon = InMemoryWagon::new();
        assert!(matches!(
            wagon.put("../x", b"x", &Meta::new()),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn empty_store() {
        let wagon = InMemoryWagon::default();
        assert!(wagon.is_empty().unwrap());
        assert!(wagon.list(&ListSpec::new()).unwrap().is_empty());
        assert!(format!("{wagon:?}").contains("object_count"));
    }
}
