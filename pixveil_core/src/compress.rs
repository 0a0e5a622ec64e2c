//! Compression provider. Replaces the dynamically-dispatched
//! `CompressionStrategy` class hierarchy with a tagged enum and this small
//! dispatch function (see spec.md §9 design note), using `flate2` for gzip
//! and `brotli` for brotli -- both idioms already present across the
//! retrieval pack for exactly this kind of payload framing.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{PixVeilError, Result};
use crate::model::CompressionStrategy;

pub fn compress(data: &[u8], strategy: CompressionStrategy) -> Result<Vec<u8>> {
    match strategy {
        CompressionStrategy::None => Ok(data.to_vec()),
        CompressionStrategy::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionStrategy::Brotli => {
            let mut out = Vec::new();
            let params = brotli::enc::BrotliEncoderParams::default();
            brotli::BrotliCompress(&mut &data[..], &mut out, &params)
                .map_err(|e| PixVeilError::DecompressionFailed(e.to_string()))?;
            Ok(out)
        }
    }
}

pub fn decompress(data: &[u8], strategy: CompressionStrategy) -> Result<Vec<u8>> {
    match strategy {
        CompressionStrategy::None => Ok(data.to_vec()),
        CompressionStrategy::Gzip => {
            let mut decoder = GzDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| PixVeilError::DecompressionFailed(e.to_string()))?;
            Ok(out)
        }
        CompressionStrategy::Brotli => {
            let mut out = Vec::new();
            brotli::BrotliDecompress(&mut &data[..], &mut out)
                .map_err(|e| PixVeilError::DecompressionFailed(e.to_string()))?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_strategy() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(16);
        for strategy in [
            CompressionStrategy::None,
            CompressionStrategy::Gzip,
            CompressionStrategy::Brotli,
        ] {
            let compressed = compress(&data, strategy).unwrap();
            let decompressed = decompress(&compressed, strategy).unwrap();
            assert_eq!(decompressed, data, "strategy {:?}", strategy);
        }
    }

    #[test]
    fn none_strategy_is_identity() {
        let data = b"raw bytes".to_vec();
        assert_eq!(compress(&data, CompressionStrategy::None).unwrap(), data);
    }
}
