//! The controller's 16-bit frame checksum.
//!
//! This is not a textbook CRC-16. Two registers are seeded from the first two
//! bytes and every following byte is shifted through them one bit at a time,
//! folding in `0x10`/`0x41` whenever a set bit leaves the high register. It has
//! to match the controller bit for bit.

use crate::error::{Result, TracerError};

/// Compute the checksum of `buffer`.
///
/// Buffers shorter than two bytes cannot seed the registers and are rejected.
pub fn checksum(buffer: &[u8]) -> Result<u16> {
    match buffer {
        [r1, r2, rest @ ..] => Ok(fold(*r1, *r2, rest.iter().copied())),
        _ => Err(TracerError::ChecksumSpan {
            length: buffer.len(),
        }),
    }
}

/// Shift `rest` through the seeded register pair.
pub(crate) fn fold(mut r1: u8, mut r2: u8, rest: impl IntoIterator<Item = u8>) -> u16 {
    for mut r3 in rest {
        for _ in 0..8 {
            let r4 = r1;
            r1 = (r1 << 1) | (r2 >> 7);
            r2 = (r2 << 1) | (r3 >> 7);
            r3 <<= 1;
            if r4 & 0x80 != 0 {
                r1 ^= 0x10;
                r2 ^= 0x41;
            }
        }
    }
    u16::from_be_bytes([r1, r2])
}
