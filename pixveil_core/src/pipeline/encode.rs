//! Encode orchestrator: file → compress → encrypt → checksum → chunk →
//! analyze carriers → pick distribution carrier → distribute → inject →
//! write map.

use std::path::Path;

use log::info;

use crate::cache::ToneCache;
use crate::carrier_map::write_carrier_map;
use crate::chunker::chunk_payload;
use crate::compress::compress;
use crate::config::PixVeilConfig;
use crate::crypto::{encrypt, sha256_raw};
use crate::distributor::distribute_chunks;
use crate::error::{PixVeilError, Result};
use crate::map::serialize_map;
use crate::model::{CompressionStrategy, DistributionMap, FileCapacityInfo};
use crate::steganography::injector::inject_all;
use crate::tone::analyze_carrier;

use super::{encode_stage, EncodeState};

const SEQ_LEN: usize = 3;

/// Hides `input_path`'s bytes across the PNGs in `png_folder`, writing the
/// resulting carrier set to `output_dir`. `strategy` governs compression of
/// the file payload; the distribution map itself is always stored
/// uncompressed (see `pipeline::decode` for why).
pub fn encode(
    input_path: &Path,
    png_folder: &Path,
    output_dir: &Path,
    password: &str,
    strategy: CompressionStrategy,
    config: &PixVeilConfig,
) -> Result<()> {
    info!("pipeline state INIT");
    std::fs::create_dir_all(output_dir)?;

    let plaintext = encode_stage(EncodeState::ReadInput, || Ok(std::fs::read(input_path)?))?;
    info!("pipeline state READ_INPUT: read {} byte(s)", plaintext.len());

    let compressed = encode_stage(EncodeState::Compress, || compress(&plaintext, strategy))?;
    info!("pipeline state COMPRESS: {} byte(s)", compressed.len());

    let (encrypted_payload, checksum) = encode_stage(EncodeState::EncryptChecksum, || {
        let encrypted = encrypt(&compressed, password)?;
        let checksum = sha256_raw(&encrypted).to_vec();
        Ok((encrypted, checksum))
    })?;
    info!("pipeline state ENCRYPT_CHECKSUM: {} byte(s)", encrypted_payload.len());

    let chunks = encode_stage(EncodeState::Chunk, || {
        Ok(chunk_payload(&encrypted_payload, &config.chunks_definition))
    })?;
    info!("pipeline state CHUNK: {} chunk(s)", chunks.len());

    let all_carriers = encode_stage(EncodeState::AnalyzeCarriers, || analyze_all_carriers(png_folder))?;
    info!("pipeline state ANALYZE_CARRIERS: {} carrier(s)", all_carriers.len());
    if all_carriers.len() < 2 {
        return Err(PixVeilError::InsufficientCarriers { found: all_carriers.len() });
    }

    let (distribution_carrier, data_carriers) =
        encode_stage(EncodeState::PickDistributionCarrier, || pick_distribution_carrier(all_carriers))?;
    info!(
        "pipeline state PICK_DISTRIBUTION_CARRIER: {}",
        distribution_carrier.file.display()
    );

    let distribution = encode_stage(EncodeState::Distribute, || {
        distribute_chunks(
            &chunks,
            &data_carriers,
            SEQ_LEN,
            crate::config::BITS_PER_CHANNEL,
            &config.chunks_definition,
        )
    })?;
    info!("pipeline state DISTRIBUTE: {} entr(y/ies)", distribution.entries.len());

    encode_stage(EncodeState::Inject, || {
        inject_all(
            &distribution.entries,
            &distribution.chunk_bytes,
            png_folder,
            output_dir,
            &config.image_compression,
        )
    })?;
    info!("pipeline state INJECT: done");

    let original_filename = file_name(input_path);
    let map = DistributionMap {
        entries: distribution.entries,
        original_filename,
        checksum,
        encrypted_data_length: encrypted_payload.len() as u32,
        compression_strategy: strategy,
    };

    encode_stage(EncodeState::WriteMap, || {
        let map_bytes = serialize_map(&map);
        let encrypted_map = encrypt(&map_bytes, password)?;
        let dest_path = output_dir.join(file_name(&distribution_carrier.file));
        write_carrier_map(&distribution_carrier.file, &dest_path, &encrypted_map, &config.image_compression)
    })?;
    info!("pipeline state WRITE_MAP: done");

    copy_untouched_carriers(png_folder, output_dir, &distribution_carrier.file)?;

    info!("pipeline state COMPLETED");
    Ok(())
}

fn analyze_all_carriers(png_folder: &Path) -> Result<Vec<FileCapacityInfo>> {
    let cache = ToneCache::open(png_folder);
    let mut carriers = Vec::new();
    for entry in std::fs::read_dir(png_folder)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let raw = analyze_carrier(&path, &cache)?;
        carriers.push(FileCapacityInfo::from_capacity(
            path,
            raw,
            SEQ_LEN,
            crate::config::BITS_PER_CHANNEL,
        ));
    }
    Ok(carriers)
}

/// Picks the smallest-capacity carrier to hold the distribution map, leaving
/// the rest for data chunks (spec.md §4.11).
fn pick_distribution_carrier(mut carriers: Vec<FileCapacityInfo>) -> Result<(FileCapacityInfo, Vec<FileCapacityInfo>)> {
    let min_index = carriers
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| c.capacity_bytes)
        .map(|(i, _)| i)
        .expect("caller already checked at least two carriers");
    let distribution_carrier = carriers.remove(min_index);
    Ok((distribution_carrier, carriers))
}

fn copy_untouched_carriers(png_folder: &Path, output_dir: &Path, distribution_carrier: &Path) -> Result<()> {
    let distribution_name = file_name(distribution_carrier);
    for entry in std::fs::read_dir(png_folder)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let name = file_name(&path);
        if name == distribution_name {
            continue;
        }
        let dest = output_dir.join(&name);
        if !dest.exists() {
            std::fs::copy(&path, &dest)?;
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
