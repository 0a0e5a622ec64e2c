//! Reads chunk bytes back out of a carrier buffer at their recorded
//! channels, and reassembles a full set of entries into the original
//! contiguous chunk stream.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{PixVeilError, Result};
use crate::model::DistributionMapEntry;

use super::{extract_bits_from_buffer, CarrierImage};

/// Reads the channel range described by `entry` out of `buffer`, MSB-first,
/// into a byte buffer sized `ceil(needed * bits_per_channel / 8)`.
pub fn extract_entry(buffer: &[u8], entry: &DistributionMapEntry) -> Result<Vec<u8>> {
    let start = entry.start_channel as usize;
    let end = entry.end_channel as usize;
    let needed = end - start;
    let byte_len = (needed * entry.bits_per_channel as usize).div_ceil(8);
    extract_bits_from_buffer(buffer, &entry.channel_sequence, entry.bits_per_channel, start, byte_len)
}

/// Decodes every distinct carrier named by `entries` once, extracts every
/// entry's bytes, and reassembles them into a single buffer ordered by
/// `chunk_id`. Fails with `ChunkSequenceBroken` if the recovered ids are not
/// exactly `0..entries.len()`.
pub fn extract_all(entries: &[DistributionMapEntry], png_folder: &Path) -> Result<Vec<u8>> {
    let mut carriers: HashMap<&str, CarrierImage> = HashMap::new();
    for entry in entries {
        if !carriers.contains_key(entry.png_file.as_str()) {
            let path = png_folder.join(&entry.png_file);
            carriers.insert(entry.png_file.as_str(), CarrierImage::load(&path)?);
        }
    }

    let mut by_id: HashMap<u32, Vec<u8>> = HashMap::with_capacity(entries.len());
    for entry in entries {
        let carrier = carriers.get(entry.png_file.as_str()).expect("loaded above");
        let data = extract_entry(&carrier.bytes, entry)?;
        by_id.insert(entry.chunk_id, data);
    }

    let expected_count = by_id.len() as u32;
    let mut assembled = Vec::new();
    for id in 0..expected_count {
        let chunk = by_id.remove(&id).ok_or(PixVeilError::ChunkSequenceBroken {
            expected: id,
            actual: None,
        })?;
        assembled.extend_from_slice(&chunk);
    }
    Ok(assembled)
}
