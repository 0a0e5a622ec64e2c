//! Encode/decode orchestrators: explicit ordered state machines that stitch
//! together every other module in a fixed sequence, with a shared
//! error-transition rule -- any stage failure logs the stage name and
//! surfaces the error unchanged, mirroring the teacher's own state-tagged
//! `BlobError` logging in `encryption_core::blob`.

pub mod decode;
pub mod encode;

use log::error;

/// Ordered encode states (spec.md §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeState {
    Init,
    ReadInput,
    Compress,
    EncryptChecksum,
    Chunk,
    AnalyzeCarriers,
    PickDistributionCarrier,
    Distribute,
    Inject,
    WriteMap,
    Completed,
}

impl EncodeState {
    fn label(self) -> &'static str {
        match self {
            EncodeState::Init => "INIT",
            EncodeState::ReadInput => "READ_INPUT",
            EncodeState::Compress => "COMPRESS",
            EncodeState::EncryptChecksum => "ENCRYPT_CHECKSUM",
            EncodeState::Chunk => "CHUNK",
            EncodeState::AnalyzeCarriers => "ANALYZE_CARRIERS",
            EncodeState::PickDistributionCarrier => "PICK_DISTRIBUTION_CARRIER",
            EncodeState::Distribute => "DISTRIBUTE",
            EncodeState::Inject => "INJECT",
            EncodeState::WriteMap => "WRITE_MAP",
            EncodeState::Completed => "COMPLETED",
        }
    }
}

/// Ordered decode states (spec.md §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Init,
    ScanMap,
    DecryptMap,
    DecompressMap,
    ParseMap,
    ExtractChunks,
    Assemble,
    VerifyChecksum,
    Decrypt,
    Decompress,
    WriteOutput,
    Completed,
}

impl DecodeState {
    fn label(self) -> &'static str {
        match self {
            DecodeState::Init => "INIT",
            DecodeState::ScanMap => "SCAN_MAP",
            DecodeState::DecryptMap => "DECRYPT_MAP",
            DecodeState::DecompressMap => "DECOMPRESS_MAP",
            DecodeState::ParseMap => "PARSE_MAP",
            DecodeState::ExtractChunks => "EXTRACT_CHUNKS",
            DecodeState::Assemble => "ASSEMBLE",
            DecodeState::VerifyChecksum => "VERIFY_CHECKSUM",
            DecodeState::Decrypt => "DECRYPT",
            DecodeState::Decompress => "DECOMPRESS",
            DecodeState::WriteOutput => "WRITE_OUTPUT",
            DecodeState::Completed => "COMPLETED",
        }
    }
}

/// Runs one stage, logging and re-raising on failure -- the shared
/// error-transition rule both machines follow.
fn run_stage<T, S, F>(state: S, label_of: impl Fn(S) -> &'static str, f: F) -> crate::error::Result<T>
where
    F: FnOnce() -> crate::error::Result<T>,
{
    f().map_err(|e| {
        error!("pipeline transitioned to ERROR at state {}: {}", label_of(state), e);
        e
    })
}

pub(crate) fn encode_stage<T>(
    state: EncodeState,
    f: impl FnOnce() -> crate::error::Result<T>,
) -> crate::error::Result<T> {
    run_stage(state, EncodeState::label, f)
}

pub(crate) fn decode_stage<T>(
    state: DecodeState,
    f: impl FnOnce() -> crate::error::Result<T>,
) -> crate::error::Result<T> {
    run_stage(state, DecodeState::label, f)
}
