//! End-to-end encode/decode coverage, exercising the full pipeline rather
//! than any single component in isolation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use pixveil_core::cache::ToneCache;
use pixveil_core::carrier_map::find_carrier_map;
use pixveil_core::config::PixVeilConfig;
use pixveil_core::crypto::decrypt;
use pixveil_core::map::deserialize_map;
use pixveil_core::model::{CompressionStrategy, FileCapacityInfo};
use pixveil_core::tone::analyze_carrier;
use pixveil_core::{decode, encode};
use tempfile::tempdir;

const SEQ_LEN: usize = 3;

fn white_png(path: &Path, side: u32) {
    let img = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
    img.save(path).unwrap();
}

fn noisy_png(path: &Path, side: u32, seed: u8) {
    let mut img = RgbImage::new(side, side);
    let mut state = seed.wrapping_add(17);
    for pixel in img.pixels_mut() {
        state = state.wrapping_mul(31).wrapping_add(7);
        *pixel = Rgb([state, state.wrapping_add(64), state.wrapping_add(128)]);
    }
    img.save(path).unwrap();
}

#[test]
fn encode_then_decode_recovers_the_original_file_exactly() {
    // S1: "Hello, World!" through two 16x16 white PNGs, password "pw", no compression.
    let carriers_dir = tempdir().unwrap();
    white_png(&carriers_dir.path().join("a.png"), 16);
    white_png(&carriers_dir.path().join("b.png"), 16);

    let input_dir = tempdir().unwrap();
    let input_path = input_dir.path().join("secret.txt");
    fs::write(&input_path, b"Hello, World!").unwrap();

    let output_dir = tempdir().unwrap();
    let config = PixVeilConfig::default();

    encode(
        &input_path,
        carriers_dir.path(),
        output_dir.path(),
        "pw",
        CompressionStrategy::None,
        &config,
    )
    .unwrap();

    let recovered_dir = tempdir().unwrap();
    decode(output_dir.path(), recovered_dir.path(), "pw").unwrap();

    let recovered = fs::read(recovered_dir.path().join("secret.txt")).unwrap();
    assert_eq!(recovered, b"Hello, World!");
}

#[test]
fn larger_payload_spreads_across_several_carriers() {
    let carriers_dir = tempdir().unwrap();
    for i in 0u8..4 {
        noisy_png(&carriers_dir.path().join(format!("c{i}.png")), 96, i);
    }

    let input_dir = tempdir().unwrap();
    let input_path = input_dir.path().join("payload.bin");
    let payload: Vec<u8> = (0..8_000u32).map(|n| (n % 251) as u8).collect();
    fs::write(&input_path, &payload).unwrap();

    let output_dir = tempdir().unwrap();
    let mut config = PixVeilConfig::default();
    config.chunks_definition.min_chunk_size = 256;
    config.chunks_definition.max_chunk_size = 1024;
    config.chunks_definition.max_chunks_per_png = 64;

    encode(
        &input_path,
        carriers_dir.path(),
        output_dir.path(),
        "correct horse battery staple",
        CompressionStrategy::Gzip,
        &config,
    )
    .unwrap();

    let recovered_dir = tempdir().unwrap();
    decode(output_dir.path(), recovered_dir.path(), "correct horse battery staple").unwrap();

    let recovered = fs::read(recovered_dir.path().join("payload.bin")).unwrap();
    assert_eq!(recovered, payload);
}

#[test]
fn wrong_password_fails_decryption_rather_than_returning_garbage() {
    let carriers_dir = tempdir().unwrap();
    white_png(&carriers_dir.path().join("a.png"), 16);
    white_png(&carriers_dir.path().join("b.png"), 16);

    let input_dir = tempdir().unwrap();
    let input_path = input_dir.path().join("secret.txt");
    fs::write(&input_path, b"a short secret").unwrap();

    let output_dir = tempdir().unwrap();
    let config = PixVeilConfig::default();
    encode(
        &input_path,
        carriers_dir.path(),
        output_dir.path(),
        "right password",
        CompressionStrategy::None,
        &config,
    )
    .unwrap();

    let recovered_dir = tempdir().unwrap();
    let result = decode(output_dir.path(), recovered_dir.path(), "wrong password");
    assert!(result.is_err());
}

#[test]
fn corrupting_a_data_carrier_after_encode_is_caught_by_the_checksum() {
    let carriers_dir = tempdir().unwrap();
    white_png(&carriers_dir.path().join("a.png"), 24);
    white_png(&carriers_dir.path().join("b.png"), 24);
    white_png(&carriers_dir.path().join("c.png"), 24);

    let input_dir = tempdir().unwrap();
    let input_path = input_dir.path().join("secret.txt");
    fs::write(&input_path, b"corrupt me if you can").unwrap();

    let output_dir = tempdir().unwrap();
    let config = PixVeilConfig::default();
    encode(
        &input_path,
        carriers_dir.path(),
        output_dir.path(),
        "pw",
        CompressionStrategy::None,
        &config,
    )
    .unwrap();

    // Flip a low bit in every pixel of every output PNG; whichever one(s)
    // actually carry chunk data will desync the reassembled payload from its
    // checksum.
    for entry in fs::read_dir(output_dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let mut img = image::open(&path).unwrap().to_rgb8();
        for pixel in img.pixels_mut() {
            pixel[0] ^= 0b11;
        }
        img.save(&path).unwrap();
    }

    let recovered_dir = tempdir().unwrap();
    let result = decode(output_dir.path(), recovered_dir.path(), "pw");
    assert!(result.is_err());
}

#[test]
fn distribution_respects_disjointness_and_capacity_end_to_end() {
    let carriers_dir = tempdir().unwrap();
    for i in 0u8..5 {
        noisy_png(&carriers_dir.path().join(format!("c{i}.png")), 48, i);
    }

    let input_dir = tempdir().unwrap();
    let input_path = input_dir.path().join("payload.bin");
    let payload: Vec<u8> = (0..6_000u32).map(|n| (n % 233) as u8).collect();
    fs::write(&input_path, &payload).unwrap();

    let output_dir = tempdir().unwrap();
    let mut config = PixVeilConfig::default();
    config.chunks_definition.min_chunk_size = 128;
    config.chunks_definition.max_chunk_size = 512;
    config.chunks_definition.max_chunks_per_png = 8;

    encode(
        &input_path,
        carriers_dir.path(),
        output_dir.path(),
        "correct horse battery staple",
        CompressionStrategy::None,
        &config,
    )
    .unwrap();

    // Pull the DistributionMap the encoder actually emitted back out of the
    // written carrier set, the same way `pipeline::decode` does, so P3/P4 are
    // checked against what was really written rather than an internal value.
    let encrypted_map = find_carrier_map(output_dir.path()).unwrap().unwrap();
    let map_bytes = decrypt(&encrypted_map, "correct horse battery staple").unwrap();
    let map = deserialize_map(&map_bytes).unwrap();

    let mut by_carrier: HashMap<&str, Vec<&pixveil_core::model::DistributionMapEntry>> = HashMap::new();
    for entry in &map.entries {
        by_carrier.entry(entry.png_file.as_str()).or_default().push(entry);
    }

    let cache = ToneCache::open(output_dir.path());
    for (png_file, mut entries) in by_carrier {
        // P3: disjointness. Sorted by start, no entry may begin before its
        // predecessor ends.
        entries.sort_by_key(|e| e.start_channel);
        for pair in entries.windows(2) {
            assert!(
                pair[0].end_channel <= pair[1].start_channel,
                "overlapping channel ranges on {png_file}: {:?} vs {:?}",
                pair[0],
                pair[1]
            );
        }

        // P4: capacity respect. Neither the chunk count nor the total bytes
        // claimed on this carrier may exceed what was configured/available.
        assert!(
            (entries.len() as u32) <= config.chunks_definition.max_chunks_per_png,
            "{png_file} carries {} chunk(s), over the configured max of {}",
            entries.len(),
            config.chunks_definition.max_chunks_per_png
        );

        let bits_per_channel = entries[0].bits_per_channel;
        let used_bytes: u64 = entries
            .iter()
            .map(|e| ((e.end_channel - e.start_channel) as u64 * bits_per_channel as u64) / 8)
            .sum();

        let carrier_path = output_dir.path().join(png_file);
        let raw = analyze_carrier(&carrier_path, &cache).unwrap();
        let capacity = FileCapacityInfo::from_capacity(carrier_path.clone(), raw, SEQ_LEN, bits_per_channel);
        assert!(
            used_bytes <= capacity.capacity_bytes,
            "{png_file} used {used_bytes} byte(s), over its capacity of {}",
            capacity.capacity_bytes
        );
    }

    let recovered_dir = tempdir().unwrap();
    decode(output_dir.path(), recovered_dir.path(), "correct horse battery staple").unwrap();
    let recovered = fs::read(recovered_dir.path().join("payload.bin")).unwrap();
    assert_eq!(recovered, payload);
}
