use imsto_types::shard_path;

use crate::error::{StoreError, StoreResult};

/// Suffix of metadata sidecars; keys may not end with it.
pub const META_SUFFIX: &str = ".meta";

/// Validate `id` and map it to its sharded storage key.
///
/// Rejects empty keys, absolute paths, `.`/`..` or empty segments,
/// backslashes, NUL bytes and the reserved sidecar suffix.
pub fn storage_key(id: &str) -> StoreResult<String> {
    if !is_relative_path(id) || id.ends_with(META_SUFFIX) {
        return Err(StoreError::InvalidKey(id.to_string()));
    }
    Ok(shard_path(id))
}

/// Non-empty `/`-separated path that stays below the root it is joined to.
pub(crate) fn is_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains(['\\', '\0'])
        && !path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
}
