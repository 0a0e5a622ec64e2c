//! Tone analysis: classifies every pixel of a PNG carrier into a luminance
//! band and reports the resulting pixel counts.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::ToneCache;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Low,
    Mid,
    High,
}

/// Pixel counts per luminance band. These are *pixel* counts, not channel
/// counts -- the placement engine (see `placement.rs`) is responsible for
/// scaling them up by the channel-sequence length when it needs an actual
/// logical-channel address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageCapacity {
    pub low: u64,
    pub mid: u64,
    pub high: u64,
}

impl ImageCapacity {
    pub fn total_pixels(&self) -> u64 {
        self.low + self.mid + self.high
    }

    /// The label whose count is largest; ties broken low > mid > high.
    pub fn predominant_tone(&self) -> Tone {
        if self.low >= self.mid && self.low >= self.high {
            Tone::Low
        } else if self.mid >= self.high {
            Tone::Mid
        } else {
            Tone::High
        }
    }
}

/// Classifies a single luminance value using the Rec. 709 coefficients.
pub fn classify_luminance(r: u8, g: u8, b: u8) -> Tone {
    let y = 0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64;
    if y < 85.0 {
        Tone::Low
    } else if y < 170.0 {
        Tone::Mid
    } else {
        Tone::High
    }
}

/// Decodes a PNG, drops alpha, and classifies every pixel into a tone band.
/// Cached by `(absolute_path, file_size_bytes)` through `cache`.
pub fn analyze_carrier(path: &Path, cache: &ToneCache) -> Result<ImageCapacity> {
    let canonical = std::fs::canonicalize(path)?;
    let file_size = std::fs::metadata(&canonical)?.len();

    if let Some(hit) = cache.get(&canonical, file_size) {
        debug!("tone cache hit for {}", canonical.display());
        return Ok(hit);
    }

    let img = image::open(&canonical)?.to_rgb8();
    let mut capacity = ImageCapacity::default();
    for pixel in img.pixels() {
        match classify_luminance(pixel[0], pixel[1], pixel[2]) {
            Tone::Low => capacity.low += 1,
            Tone::Mid => capacity.mid += 1,
            Tone::High => capacity.high += 1,
        }
    }

    cache.set(&canonical, file_size, capacity);
    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::tempdir;

    fn save_png(path: &Path, img: &RgbImage) {
        img.save(path).unwrap();
    }

    #[test]
    fn grayscale_128_is_all_mid() {
        // S2: 8x8 grayscale filled with 128 -> {low:0, mid:64, high:0}
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = RgbImage::from_pixel(8, 8, image::Rgb([128, 128, 128]));
        save_png(&path, &img);

        let cache = ToneCache::in_memory();
        let capacity = analyze_carrier(&path, &cache).unwrap();
        assert_eq!(capacity, ImageCapacity { low: 0, mid: 64, high: 0 });
    }

    #[test]
    fn white_is_all_high() {
        // S3: 8x8 RGBA filled with (255,255,255,255), alpha dropped -> all high
        let dir = tempdir().unwrap();
        let path = dir.path().join("white.png");
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]));
        img.save(&path).unwrap();

        let cache = ToneCache::in_memory();
        let capacity = analyze_carrier(&path, &cache).unwrap();
        assert_eq!(capacity, ImageCapacity { low: 0, mid: 0, high: 64 });
    }

    #[test]
    fn predominant_tone_breaks_ties_toward_low() {
        let capacity = ImageCapacity { low: 10, mid: 10, high: 10 };
        assert_eq!(capacity.predominant_tone(), Tone::Low);
        let capacity = ImageCapacity { low: 1, mid: 10, high: 10 };
        assert_eq!(capacity.predominant_tone(), Tone::Mid);
    }
}
