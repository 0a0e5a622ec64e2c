//! Raw-pixel LSB steganography over PNG carriers: loading/saving carrier
//! buffers and the MSB-first bit-packing helpers the injector and extractor
//! share.
//!
//! Distinct from the teacher's ancillary-chunk carrier
//! (`encryption_core::steganography::png_chunk`), which hides data in an
//! unparsed custom PNG chunk rather than the pixel data itself; this module
//! keeps the teacher's `StegoCarrier`-style separation of "load/validate a
//! carrier" from "read/write its payload" but targets pixel LSBs because
//! that is what the tone-aware placement engine and channel addressing
//! operate on.

pub mod extractor;
pub mod injector;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use std::path::Path;

use crate::channel::{channel_to_byte_index, Channel};
use crate::config::ImageCompressionConfig;
use crate::error::Result;

/// Number of interleaved channels in a loaded carrier buffer after alpha has
/// been dropped.
pub const IMAGE_CHANNELS: usize = 3;

/// A decoded carrier: raw, interleaved RGB bytes plus dimensions.
pub struct CarrierImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CarrierImage {
    /// Decodes a PNG, drops alpha, and forces sRGB 8-bit RGB.
    pub fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Self {
            bytes: img.into_raw(),
            width,
            height,
        })
    }

    /// Re-encodes the buffer to PNG using the configured compression level
    /// and adaptive-filtering flag.
    pub fn save(&self, path: &Path, cfg: &ImageCompressionConfig) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);

        let compression = match cfg.compression_level {
            0 => CompressionType::Fast,
            1..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        };
        let filter = if cfg.adaptive_filtering {
            FilterType::Paeth
        } else {
            FilterType::NoFilter
        };

        let encoder = PngEncoder::new_with_quality(writer, compression, filter);
        encoder.write_image(&self.bytes, self.width, self.height, image::ColorType::Rgb8)?;
        Ok(())
    }
}

/// Extracts `count` bits starting at absolute bit offset `bit_offset` from
/// `data`, MSB-first. Reads past the end of `data` return 0 (used when the
/// last chunk's final channel step carries fewer than `bits_per_channel`
/// real payload bits).
pub fn read_bits_msb(data: &[u8], bit_offset: usize, count: u8) -> u8 {
    let mut value = 0u8;
    for i in 0..count as usize {
        let bit_index = bit_offset + i;
        let byte = data.get(bit_index / 8).copied().unwrap_or(0);
        let bit = (byte >> (7 - (bit_index % 8))) & 1;
        value = (value << 1) | bit;
    }
    value
}

/// Writes the low `count` bits of `value` into `data` starting at absolute
/// bit offset `bit_offset`, MSB-first, growing `data` if needed.
pub fn write_bits_msb(data: &mut Vec<u8>, bit_offset: usize, count: u8, value: u8) {
    let needed_bytes = (bit_offset + count as usize).div_ceil(8);
    if data.len() < needed_bytes {
        data.resize(needed_bytes, 0);
    }
    for i in 0..count as usize {
        let bit_index = bit_offset + i;
        let byte_idx = bit_index / 8;
        let bit_pos = 7 - (bit_index % 8);
        let bit = (value >> (count as usize - 1 - i)) & 1;
        if bit == 1 {
            data[byte_idx] |= 1 << bit_pos;
        } else {
            data[byte_idx] &= !(1 << bit_pos);
        }
    }
}

/// Writes `data`'s bytes into `buffer` over `needed_channels(data, bpc)`
/// logical channels starting at `start_channel`, under `sequence`. Shared by
/// the per-chunk injector and the distribution-map carrier, both of which
/// write a flat byte buffer into a contiguous channel range.
pub fn insert_bits_into_buffer(
    buffer: &mut [u8],
    sequence: &[Channel],
    bits_per_channel: u8,
    start_channel: usize,
    data: &[u8],
) -> Result<()> {
    let needed = crate::placement::channels_needed(data.len(), bits_per_channel);
    for i in 0..needed {
        let bit_offset = i * bits_per_channel as usize;
        let value = read_bits_msb(data, bit_offset, bits_per_channel);
        let channel_index = start_channel + i;
        let byte_index = channel_to_byte_index(channel_index, sequence, IMAGE_CHANNELS, buffer.len())?;
        buffer[byte_index] = crate::bitcodec::insert_bits(buffer[byte_index], value, 0, bits_per_channel);
    }
    Ok(())
}

/// Inverse of [`insert_bits_into_buffer`]: reads `byte_len` bytes' worth of
/// channels starting at `start_channel`.
pub fn extract_bits_from_buffer(
    buffer: &[u8],
    sequence: &[Channel],
    bits_per_channel: u8,
    start_channel: usize,
    byte_len: usize,
) -> Result<Vec<u8>> {
    let needed = crate::placement::channels_needed(byte_len, bits_per_channel);
    let mut out = Vec::new();
    for i in 0..needed {
        let channel_index = start_channel + i;
        let byte_index = channel_to_byte_index(channel_index, sequence, IMAGE_CHANNELS, buffer.len())?;
        let value = crate::bitcodec::extract_bits(buffer[byte_index], 0, bits_per_channel);
        write_bits_msb(&mut out, i * bits_per_channel as usize, bits_per_channel, value);
    }
    out.truncate(byte_len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_packing_round_trips() {
        let source = [0b1011_0110u8, 0b0100_1101];
        let mut out = Vec::new();
        let mut bit_offset = 0;
        let mut values = Vec::new();
        while bit_offset < source.len() * 8 {
            let v = read_bits_msb(&source, bit_offset, 2);
            values.push(v);
            bit_offset += 2;
        }
        let mut write_offset = 0;
        for v in values {
            write_bits_msb(&mut out, write_offset, 2, v);
            write_offset += 2;
        }
        assert_eq!(out, source);
    }
}
