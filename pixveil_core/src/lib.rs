//! Tone-aware LSB steganography: hides an arbitrary file inside a set of PNG
//! carrier images and recovers it bit-exactly. See `pipeline::encode` and
//! `pipeline::decode` for the two public entry points.

pub mod bitcodec;
pub mod bitmap;
pub mod cache;
pub mod carrier_map;
pub mod channel;
pub mod chunker;
pub mod compress;
pub mod config;
pub mod crypto;
pub mod distributor;
pub mod error;
pub mod map;
pub mod model;
pub mod pipeline;
pub mod placement;
pub mod steganography;
pub mod tone;

pub use config::PixVeilConfig;
pub use error::{PixVeilError, Result};
pub use model::CompressionStrategy;
pub use pipeline::decode::decode;
pub use pipeline::encode::encode;
