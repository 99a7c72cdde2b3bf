//! Conversion between hexadecimal content digests and base-36 entry ids.
//!
//! The conversion is a full positional base change over the digit string, so
//! the numeric value is preserved exactly for digests of any length. Leading
//! zero nibbles carry no value and are dropped by [`IdCodec::encode`];
//! [`IdCodec::decode`] restores them by left-padding to the codec's width.

use crate::error::{IdError, IdResult};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Base-16 ⇄ base-36 codec for digests of a fixed hex width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdCodec {
    width: usize,
}

impl IdCodec {
    /// Codec for 128-bit digests (32 hex characters).
    pub const MD5: Self = Self { width: 32 };

    /// Create a codec for digests of `width` hex characters.
    pub const fn new(width: usize) -> Self {
        Self { width }
    }

    /// Hex width of the digests handled by this codec.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Convert a base-16 digest into a lowercase base-36 id.
    ///
    /// Input is case-insensitive. Fails with [`IdError::InvalidDigits`] on
    /// characters outside `[0-9a-fA-F]`.
    pub fn encode(&self, hash: &str) -> IdResult<String> {
        if hash.len() > self.width {
            return Err(IdError::InvalidLength {
                expected: self.width,
                actual: hash.len(),
            });
        }
        convert(hash, 16, 36)
    }

    /// Convert a base-36 id back into its base-16 digest, zero-padded to the
    /// codec width.
    pub fn decode(&self, id: &str) -> IdResult<String> {
        let hex = convert(id, 36, 16)?;
        if hex.len() > self.width {
            return Err(IdError::InvalidLength {
                expected: self.width,
                actual: hex.len(),
            });
        }
        Ok(format!("{hex:0>width$}", width = self.width))
    }
}

impl Default for IdCodec {
    fn default() -> Self {
        Self::MD5
    }
}

/// Encode a 32-character hex digest with [`IdCodec::MD5`].
pub fn encode(hash: &str) -> IdResult<String> {
    IdCodec::MD5.encode(hash)
}

/// Decode a base-36 id with [`IdCodec::MD5`].
pub fn decode(id: &str) -> IdResult<String> {
    IdCodec::MD5.decode(id)
}

/// Positional base change by repeated long division of the digit vector.
fn convert(input: &str, from: u32, to: u32) -> IdResult<String> {
    if input.is_empty() {
        return Err(IdError::Empty);
    }

    let mut digits = input
        .chars()
        .map(|c| c.to_digit(from))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| IdError::InvalidDigits {
            input: input.to_string(),
            radix: from,
        })?;

    let mut start = digits.iter().position(|&d| d != 0).unwrap_or(digits.len());
    let mut out = Vec::new();
    while start < digits.len() {
        let mut rem = 0u32;
        for d in &mut digits[start..] {
            let acc = rem * from + *d;
            *d = acc / to;
            rem = acc % to;
        }
        out.push(ALPHABET[rem as usize]);
        while start < digits.len() && digits[start] == 0 {
            start += 1;
        }
    }

    if out.is_empty() {
        return Ok("0".to_string());
    }
    out.reverse();
    Ok(out.into_iter().map(char::from).collect())
}
