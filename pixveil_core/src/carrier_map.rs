//! Writes and recovers the distribution map itself, carried in a single PNG
//! at a fixed `bits_per_channel = 2`, `channel_sequence = [R, G, B]`,
//! `start_channel = 0`, exactly like every other chunk except that its own
//! length is unknown up front -- so the carrier is framed as
//! `MAGIC | length(u32 BE) | encrypted_map_bytes`, read back length-first.

use std::path::Path;

use crate::channel::{channel_to_byte_index, Channel};
use crate::config::ImageCompressionConfig;
use crate::error::{PixVeilError, Result};
use crate::map::MAGIC;
use crate::steganography::{extract_bits_from_buffer, insert_bits_into_buffer, CarrierImage};

const BITS_PER_CHANNEL: u8 = 2;

fn fixed_sequence() -> Vec<Channel> {
    Channel::data_channels().to_vec()
}

/// Embeds `MAGIC | len(u32 BE) | encrypted_map` into `carrier_path`'s pixel
/// data starting at channel 0, then re-encodes to `dest_path`.
pub fn write_carrier_map(
    carrier_path: &Path,
    dest_path: &Path,
    encrypted_map: &[u8],
    cfg: &ImageCompressionConfig,
) -> Result<()> {
    let mut framed = Vec::with_capacity(4 + 4 + encrypted_map.len());
    framed.extend_from_slice(&MAGIC);
    framed.extend_from_slice(&(encrypted_map.len() as u32).to_be_bytes());
    framed.extend_from_slice(encrypted_map);

    let mut carrier = CarrierImage::load(carrier_path)?;
    let sequence = fixed_sequence();
    // Total logical-channel address space equals `buffer.len()` exactly
    // because `sequence.len() == IMAGE_CHANNELS == 3` here (see
    // `placement.rs`'s module docs for the general address-space rule).
    let needed_channels = crate::placement::channels_needed(framed.len(), BITS_PER_CHANNEL);
    if needed_channels > carrier.bytes.len() {
        return Err(PixVeilError::MapDoesNotFit {
            needed: framed.len(),
            available: carrier.bytes.len() * BITS_PER_CHANNEL as usize / 8,
        });
    }

    insert_bits_into_buffer(&mut carrier.bytes, &sequence, BITS_PER_CHANNEL, 0, &framed)?;
    carrier.save(dest_path, cfg)
}

/// Scans `png_folder` for a PNG whose first 8 channels decode to `MAGIC`
/// followed by a plausible length, returning the recovered encrypted map
/// bytes for the first match. Returns `None` if no candidate carries the
/// magic.
pub fn find_carrier_map(png_folder: &Path) -> Result<Option<Vec<u8>>> {
    let entries = std::fs::read_dir(png_folder)?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        if let Some(map_bytes) = try_read_carrier_map(&path)? {
            return Ok(Some(map_bytes));
        }
    }
    Ok(None)
}

fn try_read_carrier_map(path: &Path) -> Result<Option<Vec<u8>>> {
    let carrier = match CarrierImage::load(path) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    let sequence = fixed_sequence();

    let header_channels = crate::placement::channels_needed(8, BITS_PER_CHANNEL);
    if header_channels > carrier.bytes.len() {
        return Ok(None);
    }
    let header = extract_bits_from_buffer(&carrier.bytes, &sequence, BITS_PER_CHANNEL, 0, 8)?;
    if header[0..4] != MAGIC {
        return Ok(None);
    }
    let declared_len = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;

    let total_len = 8 + declared_len;
    let total_channels = crate::placement::channels_needed(total_len, BITS_PER_CHANNEL);
    if total_channels > carrier.bytes.len() {
        return Err(PixVeilError::MapTruncated);
    }
    let framed = extract_bits_from_buffer(&carrier.bytes, &sequence, BITS_PER_CHANNEL, 0, total_len)?;
    Ok(Some(framed[8..].to_vec()))
}
