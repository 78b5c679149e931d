//! 24-bit sample packing
//!
//! Exported payload is always least-significant byte first, whatever byte
//! order the destination container uses natively. Files exported earlier
//! rely on this layout, so it must not change.

use crate::volume::SAMPLE_MASK;

/// Bytes per packed sample
pub const BYTES_PER_SAMPLE: usize = 3;

/// Pack the low 24 bits of `sample`, least-significant byte first
#[inline]
pub fn pack_le24(sample: u32) -> [u8; 3] {
    let bytes = (sample & SAMPLE_MASK).to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

/// Append column `channel` of interleaved `samples` to `out`
///
/// `samples` holds whole frames of `channels` samples each.
pub fn pack_column(samples: &[u32], channels: usize, channel: usize, out: &mut Vec<u8>) {
    for frame in samples.chunks_exact(channels) {
        out.extend_from_slice(&pack_le24(frame[channel]));
    }
}
