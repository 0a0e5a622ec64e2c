//! Serializes/deserializes the full placement plan: the distribution map's
//! own self-description, used as the decode side's recovery key.
//!
//! Big-endian, no implicit padding, framed by the 4-byte magic
//! `0xDE 0xAD 0xFA 0xCE`. Hand-rolled rather than derived through
//! serde/bincode, grounded on the teacher's own hand-rolled, explicit
//! `Cursor`-based PNG chunk reader/writer in
//! `encryption_core::steganography::png_chunk`.

use crate::channel::Channel;
use crate::error::{PixVeilError, Result};
use crate::model::{CompressionStrategy, DistributionMap, DistributionMapEntry};

pub const MAGIC: [u8; 4] = [0xDE, 0xAD, 0xFA, 0xCE];

/// Packs a channel sequence 2 bits per entry, big-endian within byte, with
/// zero padding in the tail byte.
fn pack_channel_sequence(sequence: &[Channel]) -> Vec<u8> {
    let mut packed = vec![0u8; sequence.len().div_ceil(4)];
    for (i, channel) in sequence.iter().enumerate() {
        let byte_index = i / 4;
        let shift = 6 - 2 * (i % 4);
        packed[byte_index] |= channel.code() << shift;
    }
    packed
}

fn unpack_channel_sequence(packed: &[u8], seq_len: u8) -> Result<Vec<Channel>> {
    let mut sequence = Vec::with_capacity(seq_len as usize);
    for i in 0..seq_len as usize {
        let byte_index = i / 4;
        let shift = 6 - 2 * (i % 4);
        let code = (packed[byte_index] >> shift) & 0b11;
        let channel = Channel::from_code(code).filter(|c| !matches!(c, Channel::A)).ok_or_else(|| {
            PixVeilError::MapMalformed {
                reason: format!("channel sequence code {} is not R/G/B", code),
            }
        })?;
        sequence.push(channel);
    }
    Ok(sequence)
}

/// Serializes a `DistributionMap` into `MAGIC | size | content` framing.
pub fn serialize_map(map: &DistributionMap) -> Vec<u8> {
    let mut content = Vec::new();

    content.extend_from_slice(&(map.entries.len() as u32).to_be_bytes());
    for entry in &map.entries {
        content.extend_from_slice(&entry.chunk_id.to_be_bytes());
        write_string(&mut content, &entry.png_file);
        content.extend_from_slice(&entry.start_channel.to_be_bytes());
        content.extend_from_slice(&entry.end_channel.to_be_bytes());
        content.push(entry.bits_per_channel);
        content.push(entry.channel_sequence.len() as u8);
        content.extend_from_slice(&pack_channel_sequence(&entry.channel_sequence));
    }

    content.extend_from_slice(&(map.checksum.len() as u16).to_be_bytes());
    content.extend_from_slice(&map.checksum);

    write_string(&mut content, &map.original_filename);

    content.extend_from_slice(&map.encrypted_data_length.to_be_bytes());
    content.push(map.compression_strategy.code());

    let mut out = Vec::with_capacity(4 + 4 + content.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&(content.len() as u32).to_be_bytes());
    out.extend_from_slice(&content);
    out
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// A small bounds-checked cursor over the map's `content` bytes. Every read
/// that would run past `content`'s end fails with `MapMalformed` rather
/// than panicking.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(PixVeilError::MapMalformed {
                reason: format!(
                    "attempted to read {} bytes at offset {} past content end {}",
                    n,
                    self.pos,
                    self.bytes.len()
                ),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PixVeilError::MapMalformed {
            reason: "field is not valid utf-8".into(),
        })
    }
}

/// Deserializes a `MAGIC | size | content` buffer back into a
/// `DistributionMap`. Rejects a missing/corrupted magic, a declared size
/// that exceeds the remaining buffer, any field read beyond content end,
/// and any channel-sequence code outside `{0,1,2}`.
pub fn deserialize_map(bytes: &[u8]) -> Result<DistributionMap> {
    if bytes.len() < 8 || bytes[0..4] != MAGIC {
        return Err(PixVeilError::MagicNotFound);
    }
    let size = u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let content_start = 8;
    if content_start + size > bytes.len() {
        return Err(PixVeilError::MapTruncated);
    }
    let content = &bytes[content_start..content_start + size];

    let mut r = Reader::new(content);
    let entry_count = r.u32()?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let chunk_id = r.u32()?;
        let png_file = r.string()?;
        let start_channel = r.u32()?;
        let end_channel = r.u32()?;
        let bits_per_channel = r.u8()?;
        let seq_len = r.u8()?;
        let packed = r.take((seq_len as usize).div_ceil(4))?;
        let channel_sequence = unpack_channel_sequence(packed, seq_len)?;
        entries.push(DistributionMapEntry {
            chunk_id,
            png_file,
            start_channel,
            end_channel,
            bits_per_channel,
            channel_sequence,
        });
    }

    let checksum_len = r.u16()? as usize;
    let checksum = r.take(checksum_len)?.to_vec();

    let original_filename = r.string()?;
    let encrypted_data_length = r.u32()?;
    let strategy_code = r.u8()?;
    let compression_strategy = CompressionStrategy::from_code(strategy_code).ok_or_else(|| {
        PixVeilError::MapMalformed {
            reason: format!("unknown compression strategy code {}", strategy_code),
        }
    })?;

    Ok(DistributionMap {
        entries,
        original_filename,
        checksum,
        encrypted_data_length,
        compression_strategy,
    })
}
