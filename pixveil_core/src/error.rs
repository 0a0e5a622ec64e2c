use thiserror::Error;

/// Errors surfaced by the encode/decode pipelines and their components.
///
/// Each variant corresponds to one of the named error kinds in the pipeline
/// error-handling design: most are fatal and simply propagate to the caller,
/// `NoPosition` is recovered locally by the distributor trying the next
/// carrier and only escalates to `CapacityExhausted` once every carrier has
/// been tried.
#[derive(Debug, Error)]
pub enum PixVeilError {
    #[error("need at least two PNG carriers, found {found}")]
    InsufficientCarriers { found: usize },

    #[error("no carrier accepted chunk {chunk_id}: capacity exhausted")]
    CapacityExhausted { chunk_id: u32 },

    #[error("placement engine exceeded its attempt budget for this carrier")]
    NoPosition,

    #[error("re-extraction after injection disagreed with the source chunk {chunk_id} in {png_file}")]
    VerificationFailed { chunk_id: u32, png_file: String },

    #[error("no carrier contained the distribution-map magic")]
    MagicNotFound,

    #[error("distribution map size field exceeds remaining buffer")]
    MapTruncated,

    #[error("distribution map is malformed: {reason}")]
    MapMalformed { reason: String },

    #[error("checksum of reassembled payload does not match the distribution map")]
    ChecksumMismatch,

    #[error("chunk sequence is broken: expected {expected}, got {actual:?}")]
    ChunkSequenceBroken {
        expected: u32,
        actual: Option<u32>,
    },

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("byte index {index} is out of bounds for a buffer of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("the distribution-map carrier does not have room for the encrypted map ({needed} bytes needed, {available} available)")]
    MapDoesNotFit { needed: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image I/O failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PixVeilError>;
