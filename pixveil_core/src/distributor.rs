//! Assigns chunks to carriers under per-image capacity and per-image
//! chunk-count caps, sorted by tone priority, emitting one distribution-map
//! entry per chunk.

use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::channel::Channel;
use crate::chunker::Chunk;
use crate::config::ChunksDefinitionConfig;
use crate::crypto::sha256_raw;
use crate::error::{PixVeilError, Result};
use crate::model::{DistributionMapEntry, FileCapacityInfo, UsedImage};
use crate::placement::place_chunk;
use crate::tone::Tone;

fn tone_rank(tone: Tone) -> u8 {
    match tone {
        Tone::Low => 0,
        Tone::Mid => 1,
        Tone::High => 2,
    }
}

/// Deterministic per-chunk channel-sequence shuffle (spec.md §4.6, §8 P7):
/// `SHA-256("chunk-" + chunk_id)`'s first 4 bytes seed a `StdRng` that drives
/// a Fisher-Yates shuffle of `[R, G, B]`. See SPEC_FULL.md §6 for why this
/// PRNG family was chosen over a hand-rolled generator.
pub fn channel_sequence_for_chunk(chunk_id: u32) -> Vec<Channel> {
    let digest = sha256_raw(format!("chunk-{}", chunk_id).as_bytes());
    let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let mut rng = StdRng::seed_from_u64(seed as u64);
    let mut sequence = Channel::data_channels();
    sequence.shuffle(&mut rng);
    sequence.to_vec()
}

pub struct DistributionResult {
    pub entries: Vec<DistributionMapEntry>,
    pub chunk_bytes: HashMap<u32, Vec<u8>>,
}

/// Distributes `chunks` (in id order) across `carriers`, excluding whichever
/// carrier has already been reserved as the distribution-map carrier.
pub fn distribute_chunks(
    chunks: &[Chunk],
    carriers: &[FileCapacityInfo],
    seq_len: usize,
    bits_per_channel: u8,
    cfg: &ChunksDefinitionConfig,
) -> Result<DistributionResult> {
    let mut order: Vec<usize> = (0..carriers.len()).collect();
    order.sort_by_key(|&i| tone_rank(carriers[i].predominant_tone));

    let mut used: Vec<UsedImage> = carriers
        .iter()
        .map(|c| UsedImage::new(&c.raw, seq_len))
        .collect();

    let mut entries = Vec::with_capacity(chunks.len());
    let mut chunk_bytes = HashMap::with_capacity(chunks.len());

    for chunk in chunks {
        let chunk_len = chunk.data.len() as u64;
        let mut placed = false;

        for &i in &order {
            let carrier = &carriers[i];
            if used[i].chunk_count == cfg.max_chunks_per_png {
                continue;
            }
            if used[i].used_capacity_bytes + chunk_len > carrier.capacity_bytes {
                continue;
            }

            let placement = place_chunk(
                &carrier.raw,
                chunk.data.len(),
                bits_per_channel,
                seq_len,
                &mut used[i].used_channels,
            );
            let (start, end) = match placement {
                Ok(range) => range,
                Err(PixVeilError::NoPosition) => continue,
                Err(other) => return Err(other),
            };

            let channel_sequence = channel_sequence_for_chunk(chunk.chunk_id);
            entries.push(DistributionMapEntry {
                chunk_id: chunk.chunk_id,
                png_file: file_name(&carrier.file),
                start_channel: start as u32,
                end_channel: end as u32,
                bits_per_channel,
                channel_sequence,
            });
            used[i].used_capacity_bytes += chunk_len;
            used[i].chunk_count += 1;
            chunk_bytes.insert(chunk.chunk_id, chunk.data.clone());
            placed = true;
            break;
        }

        if !placed {
            return Err(PixVeilError::CapacityExhausted {
                chunk_id: chunk.chunk_id,
            });
        }
    }

    for (i, carrier) in carriers.iter().enumerate() {
        if used[i].chunk_count < cfg.min_chunks_per_png {
            debug!(
                "{} received {} chunk(s), below the advisory min_chunks_per_png of {}",
                carrier.file.display(),
                used[i].chunk_count,
                cfg.min_chunks_per_png
            );
        }
    }

    Ok(DistributionResult { entries, chunk_bytes })
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::ImageCapacity;
    use std::path::PathBuf;

    fn carrier(name: &str, low: u64, mid: u64, high: u64) -> FileCapacityInfo {
        let raw = ImageCapacity { low, mid, high };
        FileCapacityInfo::from_capacity(PathBuf::from(name), raw, 3, 2)
    }

    #[test]
    fn channel_sequence_is_a_pure_function_of_chunk_id() {
        // P7: same chunk_id -> same permutation, every time.
        let a = channel_sequence_for_chunk(42);
        let b = channel_sequence_for_chunk(42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn distinct_chunk_ids_usually_differ() {
        let seqs: Vec<_> = (0..20).map(channel_sequence_for_chunk).collect();
        assert!(seqs.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn respects_capacity_and_chunk_count_caps() {
        let carriers = vec![carrier("a.png", 100, 100, 100)];
        let cfg = ChunksDefinitionConfig {
            min_chunks_per_png: 1,
            max_chunks_per_png: 2,
            min_chunk_size: 4,
            max_chunk_size: 4,
        };
        let chunks: Vec<Chunk> = (0..3)
            .map(|id| Chunk { chunk_id: id, data: vec![1, 2, 3, 4] })
            .collect();

        let result = distribute_chunks(&chunks, &carriers, 3, 2, &cfg);
        assert!(matches!(result, Err(PixVeilError::CapacityExhausted { chunk_id: 2 })));
    }

    #[test]
    fn every_entry_lands_in_a_disjoint_range_per_carrier() {
        let carriers = vec![
            carrier("low.png", 200, 50, 50),
            carrier("mid.png", 50, 200, 50),
        ];
        let cfg = ChunksDefinitionConfig {
            min_chunks_per_png: 1,
            max_chunks_per_png: 50,
            min_chunk_size: 4,
            max_chunk_size: 8,
        };
        let chunks: Vec<Chunk> = (0..30)
            .map(|id| Chunk { chunk_id: id, data: vec![id as u8; 6] })
            .collect();

        let result = distribute_chunks(&chunks, &carriers, 3, 2, &cfg).unwrap();

        let mut by_file: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
        for e in &result.entries {
            by_file
                .entry(e.png_file.clone())
                .or_default()
                .push((e.start_channel, e.end_channel));
        }
        for ranges in by_file.values() {
            for i in 0..ranges.len() {
                for j in (i + 1)..ranges.len() {
                    let (s1, e1) = ranges[i];
                    let (s2, e2) = ranges[j];
                    assert!(e1 <= s2 || e2 <= s1);
                }
            }
        }
    }
}
