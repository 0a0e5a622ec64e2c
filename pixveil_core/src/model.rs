//! Shared data-model types that cross component boundaries: carrier
//! descriptors, the distribution map, and the enums the map's
//! `compression_strategy` field carries.

use std::path::PathBuf;

use crate::bitmap::ChannelBitmap;
use crate::channel::{Channel, ChannelSequence};
use crate::tone::{ImageCapacity, Tone};

/// Replaces the dynamically-dispatched `CompressionStrategy` class hierarchy
/// with a tagged enum and a small dispatch function (see `crypto.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStrategy {
    Brotli,
    Gzip,
    None,
}

impl CompressionStrategy {
    pub fn code(self) -> u8 {
        match self {
            CompressionStrategy::Brotli => 0,
            CompressionStrategy::Gzip => 1,
            CompressionStrategy::None => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CompressionStrategy::Brotli),
            1 => Some(CompressionStrategy::Gzip),
            2 => Some(CompressionStrategy::None),
            _ => None,
        }
    }
}

/// A carrier descriptor as seen by the distributor: derived from
/// `ImageCapacity` just before distribution.
#[derive(Debug, Clone)]
pub struct FileCapacityInfo {
    pub file: PathBuf,
    pub capacity_bytes: u64,
    pub predominant_tone: Tone,
    pub raw: ImageCapacity,
}

impl FileCapacityInfo {
    pub fn from_capacity(file: PathBuf, raw: ImageCapacity, seq_len: usize, bits_per_channel: u8) -> Self {
        let total_channels = raw.total_pixels() * seq_len as u64;
        let capacity_bytes = (total_channels * bits_per_channel as u64) / 8;
        Self {
            file,
            capacity_bytes,
            predominant_tone: raw.predominant_tone(),
            raw,
        }
    }
}

/// Running per-carrier accounting during distribution.
pub struct UsedImage {
    pub used_capacity_bytes: u64,
    pub chunk_count: u32,
    pub used_channels: ChannelBitmap,
}

impl UsedImage {
    pub fn new(raw: &ImageCapacity, seq_len: usize) -> Self {
        Self {
            used_capacity_bytes: 0,
            chunk_count: 0,
            used_channels: ChannelBitmap::new(raw.total_pixels() as usize * seq_len),
        }
    }
}

/// Placement of one chunk, as recorded in the distribution map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionMapEntry {
    pub chunk_id: u32,
    pub png_file: String,
    pub start_channel: u32,
    pub end_channel: u32,
    pub bits_per_channel: u8,
    pub channel_sequence: ChannelSequence,
}

/// The full recovery plan; the only artifact that crosses the encode/decode
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionMap {
    pub entries: Vec<DistributionMapEntry>,
    pub original_filename: String,
    /// SHA-256 over the encrypted payload, stored raw (32 bytes); converted
    /// to/from hex only at the public API boundary.
    pub checksum: Vec<u8>,
    pub encrypted_data_length: u32,
    pub compression_strategy: CompressionStrategy,
}

impl Channel {
    pub fn data_channels() -> [Channel; 3] {
        [Channel::R, Channel::G, Channel::B]
    }
}
