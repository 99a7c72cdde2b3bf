use imsto_config::Config;

use crate::codec::{ImageAttr, ImageFormat, WriteOptions};
use crate::error::{EntryError, EntryResult};

/// Admission and normalization rules for one namespace.
///
/// A zero bound disables the corresponding check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPolicy {
    /// Re-encode submissions before storing them.
    pub normalize: bool,
    pub max_quality: u8,
    pub max_file_size: usize,
    pub max_width: u32,
    pub max_height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for EntryPolicy {
    fn default() -> Self {
        Self {
            normalize: true,
            max_quality: 88,
            max_file_size: 262_114,
            max_width: 1600,
            max_height: 1600,
            min_width: 50,
            min_height: 50,
        }
    }
}

impl EntryPolicy {
    /// Policy with every check disabled and no normalization.
    pub fn permissive() -> Self {
        Self {
            normalize: false,
            max_quality: 100,
            max_file_size: 0,
            max_width: 0,
            max_height: 0,
            min_width: 0,
            min_height: 0,
        }
    }

    /// Read the policy for `roof` from configuration.
    pub fn from_config(config: &dyn Config, roof: &str) -> Self {
        let int = |key: &str| config.int_value(roof, key).max(0);
        Self {
            normalize: config.bool_value(roof, "normalize").unwrap_or(true),
            max_quality: int("max_quality").clamp(1, 100) as u8,
            max_file_size: usize::try_from(int("max_file_size")).unwrap_or(usize::MAX),
            max_width: u32::try_from(int("max_width")).unwrap_or(u32::MAX),
            max_height: u32::try_from(int("max_height")).unwrap_or(u32::MAX),
            min_width: u32::try_from(int("min_width")).unwrap_or(u32::MAX),
            min_height: u32::try_from(int("min_height")).unwrap_or(u32::MAX),
        }
    }

    /// Reject submissions over `max_file_size`.
    pub fn check_size(&self, size: usize) -> EntryResult<()> {
        if self.max_file_size > 0 && size > self.max_file_size {
            return Err(EntryError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Reject images outside the configured dimension bounds.
    pub fn check_dimensions(&self, attr: &ImageAttr) -> EntryResult<()> {
        let reject = |reason| {
            Err(EntryError::Dimensions {
                width: attr.width,
                height: attr.height,
                reason,
            })
        };
        if self.max_width > 0 && attr.width > self.max_width {
            return reject("wider than max_width");
        }
        if self.max_height > 0 && attr.height > self.max_height {
            return reject("taller than max_height");
        }
        if attr.width < self.min_width {
            return reject("narrower than min_width");
        }
        if attr.height < self.min_height {
            return reject("shorter than min_height");
        }
        Ok(())
    }

    /// Re-encode target for `attr`, or `None` when normalization is off.
    ///
    /// The format is kept. Quality is capped at `max_quality`; a JPEG of
    /// unknown quality is written at `max_quality`.
    pub fn write_options(&self, attr: &ImageAttr) -> Option<WriteOptions> {
        if !self.normalize {
            return None;
        }
        let quality = match attr.quality {
            Some(q) => Some(q.min(self.max_quality)),
            None if attr.format == ImageFormat::Jpeg => Some(self.max_quality),
            None => None,
        };
        Some(WriteOptions {
            format: attr.format,
            quality,
        })
    }
}
