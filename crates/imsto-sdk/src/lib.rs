//! High-level SDK for imsto.
//!
//! [`Storage`] ties the pieces together: it resolves a namespace ("roof")
//! to its engine through the [`EngineRegistry`], builds entries with the
//! namespace's [`EntryPolicy`], and stores them under their sharded path.
//! This is the main entry point for applications embedding imsto.

pub mod error;
pub mod storage;
pub mod stored;

pub use error::{SdkError, SdkResult};
pub use storage::Storage;
pub use stored::StoredEntry;

// Re-export key types
pub use imsto_config::{Config, StoreConfig};
pub use imsto_entry::{Codec, Entry, EntryPolicy, SniffCodec};
pub use imsto_store::{EngineRegistry, ListItem, ListSpec, Meta, Wagon};
pub use imsto_types::{ContentHash, EntryId};
