use crate::error::StoreResult;
use crate::list::{ListItem, ListSpec};
use crate::meta::Meta;

/// A storage engine.
///
/// All implementations must satisfy these invariants:
/// - `put` on an existing key replaces content and metadata
///   (last-writer-wins, no optimistic concurrency).
/// - `exists` reports absence as `Ok(false)`; only faults other than
///   "not found" are errors.
/// - `get`, `delete` and `meta` fail with `NotFound` for absent keys.
///   Delete is not idempotent.
/// - `list` is ordered lexicographically by key.
/// - Instances are shared across threads; each call is self-contained.
pub trait Wagon: Send + Sync {
    /// Registered engine name.
    fn name(&self) -> &str;

    /// Read the bytes stored under `id`.
    fn get(&self, id: &str) -> StoreResult<Vec<u8>>;

    /// Store `data` under `id` and return the metadata actually persisted.
    ///
    /// The returned [`Meta`] is `meta` stamped with the engine name, the
    /// storage key and the stored size.
    fn put(&self, id: &str, data: &[u8], meta: &Meta) -> StoreResult<Meta>;

    /// Check whether `id` is stored.
    fn exists(&self, id: &str) -> StoreResult<bool>;

    /// Remove `id` and its metadata.
    fn delete(&self, id: &str) -> StoreResult<()>;

    /// Enumerate stored keys.
    fn list(&self, spec: &ListSpec) -> StoreResult<Vec<ListItem>>;

    /// Read the metadata persisted for `id`.
    fn meta(&self, id: &str) -> StoreResult<Meta>;
}
