//! Signature-based [`Codec`] that never touches pixel data.
//!
//! Recognises JPEG, PNG, GIF and WebP by their leading bytes and reads the
//! dimensions from the container headers. Encoding is the identity, so
//! entries built with this codec are always stored as submitted.

use crate::codec::{Codec, CodecError, CodecResult, ImageAttr, ImageFormat, WriteOptions};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Clone, Copy, Debug, Default)]
pub struct SniffCodec;

impl SniffCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for SniffCodec {
    fn decode(&self, raw: &[u8]) -> CodecResult<ImageAttr> {
        let (format, (width, height)) = if raw.starts_with(PNG_SIGNATURE) {
            (ImageFormat::Png, png_size(raw)?)
        } else if raw.starts_with(b"GIF87a") || raw.starts_with(b"GIF89a") {
            (ImageFormat::Gif, gif_size(raw)?)
        } else if raw.starts_with(&[0xff, 0xd8]) {
            (ImageFormat::Jpeg, jpeg_size(raw)?)
        } else if raw.len() >= 12 && &raw[..4] == b"RIFF" && &raw[8..12] == b"WEBP" {
            (ImageFormat::Webp, webp_size(raw)?)
        } else {
            return Err(CodecError::Unsupported("unrecognized image signature".into()));
        };
        Ok(ImageAttr {
            width,
            height,
            format,
            quality: None,
        })
    }

    fn encode(&self, raw: &[u8], opts: &WriteOptions) -> CodecResult<Vec<u8>> {
        let attr = self.decode(raw)?;
        if attr.format != opts.format {
            return Err(CodecError::Encode(format!(
                "cannot transcode {} to {}",
                attr.format, opts.format
            )));
        }
        Ok(raw.to_vec())
    }
}

fn be16(b: &[u8], at: usize) -> u32 {
    u32::from(u16::from_be_bytes([b[at], b[at + 1]]))
}

fn le16(b: &[u8], at: usize) -> u32 {
    u32::from(u16::from_le_bytes([b[at], b[at + 1]]))
}

fn le24(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], 0])
}

fn png_size(raw: &[u8]) -> CodecResult<(u32, u32)> {
    if raw.len() < 24 || &raw[12..16] != b"IHDR" {
        return Err(CodecError::Malformed {
            format: ImageFormat::Png,
            reason: "missing IHDR chunk",
        });
    }
    let w = u32::from_be_bytes([raw[16], raw[17], raw[18], raw[19]]);
    let h = u32::from_be_bytes([raw[20], raw[21], raw[22], raw[23]]);
    Ok((w, h))
}

fn gif_size(raw: &[u8]) -> CodecResult<(u32, u32)> {
    if raw.len() < 10 {
        return Err(CodecError::Malformed {
            format: ImageFormat::Gif,
            reason: "truncated screen descriptor",
        });
    }
    Ok((le16(raw, 6), le16(raw, 8)))
}

fn jpeg_size(raw: &[u8]) -> CodecResult<(u32, u32)> {
    let malformed = |reason| CodecError::Malformed {
        format: ImageFormat::Jpeg,
        reason,
    };
    let mut pos = 2;
    loop {
        while pos < raw.len() && raw[pos] == 0xff {
            pos += 1;
        }
        if pos >= raw.len() {
            return Err(malformed("no frame header"));
        }
        let marker = raw[pos];
        pos += 1;
        match marker {
            // standalone markers carry no length
            0x01 | 0xd0..=0xd7 => continue,
            0xd9 | 0xda => return Err(malformed("no frame header before scan")),
            _ => {}
        }
        if pos + 2 > raw.len() {
            return Err(malformed("truncated segment"));
        }
        let len = be16(raw, pos) as usize;
        if len < 2 {
            return Err(malformed("bad segment length"));
        }
        let is_sof = matches!(marker, 0xc0..=0xcf) && !matches!(marker, 0xc4 | 0xc8 | 0xcc);
        if is_sof {
            if pos + 7 > raw.len() {
                return Err(malformed("truncated frame header"));
            }
            let h = be16(raw, pos + 3);
            let w = be16(raw, pos + 5);
            return Ok((w, h));
        }
        pos += len;
    }
}

fn webp_size(raw: &[u8]) -> CodecResult<(u32, u32)> {
    let malformed = |reason| CodecError::Malformed {
        format: ImageFormat::Webp,
        reason,
    };
    if raw.len() < 30 {
        return Err(malformed("truncated header"));
    }
    match &raw[12..16] {
        b"VP8 " => {
            if raw[23..26] != [0x9d, 0x01, 0x2a] {
                return Err(malformed("bad VP8 start code"));
            }
            Ok((le16(raw, 26) & 0x3fff, le16(raw, 28) & 0x3fff))
        }
        b"VP8L" => {
            if raw[20] != 0x2f {
                return Err(malformed("bad VP8L signature"));
            }
            let b = &raw[21..25];
            let w = 1 + (u32::from(b[0]) | (u32::from(b[1] & 0x3f) << 8));
            let h = 1
                + ((u32::from(b[1]) >> 6)
                    | (u32::from(b[2]) << 2)
                    | (u32::from(b[3] & 0x0f) << 10));
            Ok((w, h))
        }
        b"VP8X" => Ok((1 + le24(raw, 24), 1 + le24(raw, 27))),
        _ => Err(malformed("unknown chunk")),
    }
}
