//! Entry construction for imsto.
//!
//! Turns submitted bytes into an immutable [`Entry`]: the canonical
//! [`EntryId`](imsto_types::EntryId), the content history, the shard path and
//! the MIME type. Image decoding and re-encoding are delegated to a [`Codec`].
//!
//! # Deduplication
//!
//! The bytes that get stored are the normalized bytes. Two different uploads
//! that normalize to the same bytes share one canonical id, one storage path
//! and therefore one stored object.

pub mod builder;
pub mod codec;
pub mod error;
pub mod lineage;
pub mod policy;
pub mod sniff;

pub use builder::{BuiltEntry, Entry, EntryBuilder};
pub use codec::{Codec, CodecError, CodecResult, ImageAttr, ImageFormat, WriteOptions};
pub use error::{EntryError, EntryResult};
pub use lineage::{Lineage, Revision};
pub use policy::EntryPolicy;
pub use sniff::SniffCodec;
