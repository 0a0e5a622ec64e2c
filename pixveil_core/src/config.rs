use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PixVeilError, Result};

/// `bits_per_channel_for_distribution_map` is fixed by design; it is kept as
/// a named constant rather than a config field so the encoder and decoder
/// can never disagree about it.
pub const BITS_PER_CHANNEL: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCompressionConfig {
    pub compression_level: u8,
    pub adaptive_filtering: bool,
}

impl Default for ImageCompressionConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            adaptive_filtering: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunksDefinitionConfig {
    pub min_chunks_per_png: u32,
    pub max_chunks_per_png: u32,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

impl Default for ChunksDefinitionConfig {
    fn default() -> Self {
        Self {
            min_chunks_per_png: 1,
            max_chunks_per_png: 16,
            min_chunk_size: 1024,
            max_chunk_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneWeightingConfig {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl Default for ToneWeightingConfig {
    /// Defaults documented in spec.md §6: 1.5/1.0/0.5 for capacity scoring.
    /// The placement engine's own band-draw weights (4/2/1) are a separate,
    /// fixed constant (see `placement::BAND_DRAW_WEIGHTS`) because spec.md
    /// §4.4 pins them as part of the placement algorithm itself, not as a
    /// tunable.
    fn default() -> Self {
        Self {
            low: 1.5,
            mid: 1.0,
            high: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PixVeilConfig {
    #[serde(default)]
    pub image_compression: ImageCompressionConfig,
    #[serde(default)]
    pub chunks_definition: ChunksDefinitionConfig,
    #[serde(default)]
    pub tone_weighting: ToneWeightingConfig,
}

impl PixVeilConfig {
    /// Loads configuration from a TOML file, falling back to documented
    /// defaults for any field (or the whole file) that is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&text)
            .map_err(|e| PixVeilError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.chunks_definition;
        if c.min_chunk_size == 0 || c.min_chunk_size > c.max_chunk_size {
            return Err(PixVeilError::InvalidConfig(format!(
                "min_chunk_size ({}) must be nonzero and <= max_chunk_size ({})",
                c.min_chunk_size, c.max_chunk_size
            )));
        }
        if c.max_chunks_per_png == 0 {
            return Err(PixVeilError::InvalidConfig(
                "max_chunks_per_png must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PixVeilConfig::default().validate().unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = PixVeilConfig::load(Path::new("/no/such/pixveil.toml")).unwrap();
        assert_eq!(cfg.chunks_definition.min_chunk_size, 1024);
    }

    #[test]
    fn rejects_inverted_chunk_bounds() {
        let mut cfg = PixVeilConfig::default();
        cfg.chunks_definition.min_chunk_size = 8192;
        cfg.chunks_definition.max_chunk_size = 1024;
        assert!(cfg.validate().is_err());
    }
}
