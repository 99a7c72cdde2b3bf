//! Storage engines ("wagons") for imsto.
//!
//! Every engine implements the [`Wagon`] trait: get, put, exists, delete and
//! list over string keys. Keys are canonical entry ids or pre-sharded paths;
//! engines apply [`shard_path`](imsto_types::shard_path) themselves.
//!
//! # Engines
//!
//! - [`FileWagon`] (`file`) -- blobs under a local root, JSON `.meta` sidecars
//! - [`InMemoryWagon`] (`memory`) -- `BTreeMap`-based, for tests and embedding
//!
//! # Registry
//!
//! [`EngineRegistry`] maps engine names to constructors and resolves a
//! namespace ("roof") to a live engine through its configured `engine` key.
//! It is populated once at startup and read-only afterwards.
//!
//! # Consistency
//!
//! Writes are last-writer-wins with no locking across callers. The file
//! engine writes the blob before its sidecar; a blob without a sidecar marks
//! an incomplete write and is left in place for external cleanup.

pub mod error;
pub mod file;
pub mod key;
pub mod list;
pub mod memory;
pub mod meta;
pub mod registry;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileWagon;
pub use key::storage_key;
pub use list::{ListItem, ListSpec, DEFAULT_LIST_LIMIT};
pub use memory::InMemoryWagon;
pub use meta::Meta;
pub use registry::{EngineCtor, EngineRegistry, RegistryError};
pub use traits::Wagon;
