//! Maps a logical channel index to a byte offset inside a raw interleaved
//! RGB image buffer, given an active channel permutation.

use crate::error::{PixVeilError, Result};

/// One color channel. R/G/B are used for data; A exists only so the
/// distribution-map codec's channel code (0..=3) has somewhere to reject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub fn code(self) -> u8 {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Channel::R),
            1 => Some(Channel::G),
            2 => Some(Channel::B),
            3 => Some(Channel::A),
            _ => None,
        }
    }

    fn offset(self) -> usize {
        self.code() as usize
    }
}

/// `channel_sequence`, e.g. `[G, R, B]`: an ordered, distinct list of R/G/B.
pub type ChannelSequence = Vec<Channel>;

/// Computes `byte_index = pixel_number * image_channels + channel_offset`
/// for logical channel index `c` under `sequence`, failing with
/// `OutOfBounds` if the resulting index does not fit in `buffer_len`.
pub fn channel_to_byte_index(
    c: usize,
    sequence: &[Channel],
    image_channels: usize,
    buffer_len: usize,
) -> Result<usize> {
    debug_assert!(!sequence.is_empty());
    let seq_index = c % sequence.len();
    let pixel_number = c / sequence.len();
    let channel_offset = sequence[seq_index].offset();
    let byte_index = pixel_number * image_channels + channel_offset;
    if byte_index >= buffer_len {
        return Err(PixVeilError::OutOfBounds {
            index: byte_index,
            len: buffer_len,
        });
    }
    Ok(byte_index)
}
