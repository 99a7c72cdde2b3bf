//! Nested directory layout for entry ids.
//!
//! `abcdef123456` is stored as `ab/cd/ef123456`, bounding the number of
//! entries per directory level for filesystem-like substrates.

/// Ids shorter than this are used as keys unchanged.
pub const MIN_ID_LENGTH: usize = 8;

/// Separator between shard segments.
pub const SEPARATOR: char = '/';

/// Map an id to its sharded key.
///
/// Short ids and keys that already contain [`SEPARATOR`] are returned as-is.
pub fn shard_path(id: &str) -> String {
    if id.contains(SEPARATOR) || id.chars().count() < MIN_ID_LENGTH {
        return id.to_string();
    }
    let mut bounds = id.char_indices().map(|(i, _)| i);
    let (first, second) = match (bounds.nth(2), bounds.nth(1)) {
        (Some(a), Some(b)) => (a, b),
        _ => return id.to_string(),
    };
    format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        &id[..first],
        &id[first..second],
        &id[second..]
    )
}
