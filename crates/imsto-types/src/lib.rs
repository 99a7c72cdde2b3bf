//! Foundation types for imsto, a content-addressed image store.
//!
//! Every other imsto crate depends on `imsto-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- MD5 digest of a byte sequence, lowercase hex
//! - [`EntryId`] -- base-36 storage identifier derived from a [`ContentHash`]
//! - [`IdCodec`] -- magnitude-preserving base-16 ⇄ base-36 conversion
//! - [`shard_path`] -- nested directory layout shared by all storage engines

pub mod codec;
pub mod error;
pub mod hash;
pub mod id;
pub mod shard;

pub use codec::{decode, encode, IdCodec};
pub use error::{IdError, IdResult};
pub use hash::ContentHash;
pub use id::EntryId;
pub use shard::{shard_path, MIN_ID_LENGTH, SEPARATOR};
