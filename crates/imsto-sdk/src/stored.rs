use imsto_entry::Entry;
use imsto_store::Meta;

/// Outcome of [`Storage::store`](crate::Storage::store).
#[derive(Clone, Debug)]
pub struct StoredEntry {
    pub entry: Entry,
    /// Metadata as recorded by the engine.
    pub meta: Meta,
    /// Whether the object was already present and the write was skipped.
    pub deduplicated: bool,
}

impl StoredEntry {
    /// Storage key the object lives under.
    pub fn key(&self) -> &str {
        self.entry.path()
    }
}
