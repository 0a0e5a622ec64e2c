//! Chooses a non-overlapping start channel inside one carrier, biased
//! toward low-tone regions.
//!
//! Address-space resolution (spec.md self-contradiction, recorded in
//! DESIGN.md): invariant 5 (`start_channel < (low+mid+high)·len(channel_sequence)`)
//! and step 1's parenthetical in §4.6 ("bitmap counts band channels, NOT
//! pixels×sequence...") describe two different address spaces for the same
//! bitmap. This engine follows invariant 5 literally: the logical-channel
//! address space is `total_pixels * channel_sequence_len`. A tone band's
//! pixel range is translated to a channel range by multiplying the chosen
//! pixel index by the sequence length, so every placement starts at a pixel
//! boundary and `needed` channels are reserved from there.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::bitmap::ChannelBitmap;
use crate::error::{PixVeilError, Result};
use crate::tone::{ImageCapacity, Tone};

const MAX_ATTEMPTS: usize = 100;

/// Fixed band-draw weights from spec.md §4.4: low=4, mid=2, high=1. This is
/// part of the placement algorithm itself, distinct from the tunable
/// `tone_weighting` config used for capacity *scoring* in the distributor.
const BAND_DRAW_WEIGHTS: [(Tone, u32); 3] = [(Tone::Low, 4), (Tone::Mid, 2), (Tone::High, 1)];

pub fn channels_needed(chunk_len_bytes: usize, bits_per_channel: u8) -> usize {
    let total_bits = chunk_len_bytes * 8;
    total_bits.div_ceil(bits_per_channel as usize)
}

/// Attempts to find a free, non-overlapping channel range of
/// `channels_needed(chunk_len_bytes, bits_per_channel)` channels inside a
/// carrier described by `capacity`, biased toward low-tone pixels. Marks the
/// range in `bitmap` on success.
pub fn place_chunk(
    capacity: &ImageCapacity,
    chunk_len_bytes: usize,
    bits_per_channel: u8,
    seq_len: usize,
    bitmap: &mut ChannelBitmap,
) -> Result<(usize, usize)> {
    let needed = channels_needed(chunk_len_bytes, bits_per_channel);
    let total_channels = capacity.total_pixels() as usize * seq_len;

    let bands: Vec<(Tone, u64, u64)> = [
        (Tone::Low, 0u64, capacity.low),
        (Tone::Mid, capacity.low, capacity.mid),
        (Tone::High, capacity.low + capacity.mid, capacity.high),
    ]
    .into_iter()
    .filter(|(_, _, count)| *count > 0)
    .collect();

    if bands.is_empty() || needed == 0 {
        return Err(PixVeilError::NoPosition);
    }

    let weights: Vec<u32> = bands
        .iter()
        .map(|(tone, _, _)| {
            BAND_DRAW_WEIGHTS
                .iter()
                .find(|(t, _)| t == tone)
                .map(|(_, w)| *w)
                .unwrap_or(1)
        })
        .collect();
    let dist = WeightedIndex::new(&weights).map_err(|_| PixVeilError::NoPosition)?;

    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ATTEMPTS {
        let (_, band_base_pixels, band_pixel_count) = bands[dist.sample(&mut rng)];
        let pixel_offset = rng.gen_range(0..band_pixel_count);
        let pixel_index = band_base_pixels + pixel_offset;
        let start = pixel_index as usize * seq_len;
        let end = start + needed;

        if end > total_channels {
            continue;
        }
        if !bitmap.is_range_free(start, end) {
            continue;
        }
        bitmap.mark_range(start, end);
        return Ok((start, end));
    }

    Err(PixVeilError::NoPosition)
}
