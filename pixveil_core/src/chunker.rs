//! Splits an encrypted payload into variable-size chunks within configured
//! bounds. Chunk sizes are randomized per call; the final chunk may be
//! shorter than `min_chunk_size` (the remainder).

use rand::Rng;

use crate::config::ChunksDefinitionConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: u32,
    pub data: Vec<u8>,
}

/// Splits `payload` into chunks of size drawn uniformly from the multiples
/// of `min_chunk_size` up to `max_chunk_size`, clamped to what remains.
/// Chunk ids are assigned starting at 0 with no gaps.
pub fn chunk_payload(payload: &[u8], cfg: &ChunksDefinitionConfig) -> Vec<Chunk> {
    let min = cfg.min_chunk_size.max(1);
    let max = cfg.max_chunk_size.max(min);
    let max_multiple = (max / min).max(1);

    let mut chunks = Vec::new();
    let mut offset = 0usize;
    let mut chunk_id = 0u32;
    let mut rng = rand::thread_rng();

    while offset < payload.len() {
        let multiple = rng.gen_range(1..=max_multiple);
        let mut size = min * multiple;
        let remaining = payload.len() - offset;
        if size > remaining {
            size = remaining;
        }
        chunks.push(Chunk {
            chunk_id,
            data: payload[offset..offset + size].to_vec(),
        });
        offset += size;
        chunk_id += 1;
    }

    if chunks.is_empty() && !payload.is_empty() {
        chunks.push(Chunk { chunk_id: 0, data: payload.to_vec() });
    }

    chunks
}
