//! Decode orchestrator: scan for the embedded map → decrypt/decompress/parse
//! it → extract and reassemble the chunks it describes → verify → decrypt →
//! decompress → write the recovered file.

use std::path::Path;

use log::info;

use crate::carrier_map::find_carrier_map;
use crate::compress::decompress;
use crate::crypto::{decrypt, sha256_raw};
use crate::error::{PixVeilError, Result};
use crate::map::deserialize_map;
use crate::steganography::extractor::extract_all;

use super::{decode_stage, DecodeState};

/// Recovers the file hidden across the PNGs in `png_folder`, writing it as
/// `output_dir/<original_filename>`. The distribution map is always stored
/// uncompressed (see module docs), so `DECOMPRESS_MAP` is an identity step
/// kept for state-machine parity with the file-payload pipeline.
pub fn decode(png_folder: &Path, output_dir: &Path, password: &str) -> Result<()> {
    info!("pipeline state INIT");
    std::fs::create_dir_all(output_dir)?;

    let encrypted_map = decode_stage(DecodeState::ScanMap, || {
        find_carrier_map(png_folder)?.ok_or(PixVeilError::MagicNotFound)
    })?;
    info!("pipeline state SCAN_MAP: found {} byte(s)", encrypted_map.len());

    let map_bytes = decode_stage(DecodeState::DecryptMap, || decrypt(&encrypted_map, password))?;
    info!("pipeline state DECRYPT_MAP: {} byte(s)", map_bytes.len());

    let map_bytes = decode_stage(DecodeState::DecompressMap, || {
        decompress(&map_bytes, crate::model::CompressionStrategy::None)
    })?;

    let map = decode_stage(DecodeState::ParseMap, || Ok(deserialize_map(&map_bytes)?))?;
    info!("pipeline state PARSE_MAP: {} entr(y/ies)", map.entries.len());

    let raw_chunks = decode_stage(DecodeState::ExtractChunks, || extract_all(&map.entries, png_folder))?;
    info!("pipeline state EXTRACT_CHUNKS: {} byte(s) recovered", raw_chunks.len());

    let assembled = decode_stage(DecodeState::Assemble, || {
        let want = map.encrypted_data_length as usize;
        if raw_chunks.len() < want {
            return Err(PixVeilError::MapMalformed {
                reason: format!(
                    "reassembled {} byte(s), but map declares encrypted_data_length {}",
                    raw_chunks.len(),
                    want
                ),
            });
        }
        Ok(raw_chunks[..want].to_vec())
    })?;
    info!("pipeline state ASSEMBLE: {} byte(s)", assembled.len());

    decode_stage(DecodeState::VerifyChecksum, || {
        if sha256_raw(&assembled).to_vec() != map.checksum {
            return Err(PixVeilError::ChecksumMismatch);
        }
        Ok(())
    })?;
    info!("pipeline state VERIFY_CHECKSUM: ok");

    let compressed_payload = decode_stage(DecodeState::Decrypt, || decrypt(&assembled, password))?;
    info!("pipeline state DECRYPT: {} byte(s)", compressed_payload.len());

    let plaintext = decode_stage(DecodeState::Decompress, || {
        decompress(&compressed_payload, map.compression_strategy)
    })?;
    info!("pipeline state DECOMPRESS: {} byte(s)", plaintext.len());

    decode_stage(DecodeState::WriteOutput, || {
        let dest = output_dir.join(&map.original_filename);
        std::fs::write(dest, &plaintext)?;
        Ok(())
    })?;
    info!("pipeline state WRITE_OUTPUT: wrote {}", map.original_filename);

    info!("pipeline state COMPLETED");
    Ok(())
}
