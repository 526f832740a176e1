/*!
Byte mirroring and scan-order remapping.

The VMU stores each 48-pixel line as 6 bytes with the rightmost byte first and
the bits of every byte mirrored. A bitmap stores the same line left to right,
most significant bit first. Converting between the two reverses each line's
byte order and mirrors each byte, which is its own inverse.
*/

use crate::protocol::{LINE_BYTES, LINE_COUNT, SCAN_BLOCK_BYTES};

/// 192 screen payload bytes in device scan order
pub type ScanBlock = [u8; SCAN_BLOCK_BYTES];

/// 32 bitmap rows of 6 content bytes, in container order
pub type ScreenRows = [[u8; LINE_BYTES]; LINE_COUNT];

/// Pixel polarity applied while remapping.
///
/// On the wire a `0` bit is an unlit pixel; in the bitmap container palette
/// index `1` is white. [`Polarity::Flip`] complements every byte so the two
/// agree, and is the default in both directions. [`Polarity::Raw`] keeps the
/// bits as they are (the `--invert` flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    Flip,
    Raw,
}

impl Polarity {
    /// Map the user-facing invert flag onto a polarity
    pub fn from_invert_flag(invert: bool) -> Self {
        if invert {
            Self::Raw
        } else {
            Self::Flip
        }
    }

    /// Apply this polarity to one byte
    #[inline]
    pub fn apply(self, byte: u8) -> u8 {
        match self {
            Self::Flip => byte ^ 0xFF,
            Self::Raw => byte,
        }
    }
}

/// Reverse the bit order of a byte (bit 0 <-> bit 7, bit 1 <-> bit 6, ...)
#[inline]
pub const fn mirror_byte(mut byte: u8) -> u8 {
    // Swap nibbles
    byte = (byte & 0xF0) >> 4 | (byte & 0x0F) << 4;
    // Swap pairs within nibbles
    byte = (byte & 0xCC) >> 2 | (byte & 0x33) << 2;
    // Swap bits within pairs
    byte = (byte & 0xAA) >> 1 | (byte & 0x55) << 1;
    byte
}

/// Remap a device scan block into bitmap rows.
pub fn scan_to_rows(block: &ScanBlock, polarity: Polarity) -> ScreenRows {
    let mut rows = [[0u8; LINE_BYTES]; LINE_COUNT];

    for (row, line) in rows.iter_mut().zip(block.chunks_exact(LINE_BYTES)) {
        for (out, &byte) in row.iter_mut().zip(line.iter().rev()) {
            *out = mirror_byte(polarity.apply(byte));
        }
    }

    rows
}

/// Remap bitmap rows into a device scan block.
///
/// Rows may be of any length and count: only the first 32 rows and the first
/// 6 bytes of each are used. Missing rows and bytes become zero on the wire;
/// polarity is applied to present bytes only.
pub fn rows_to_scan<R: AsRef<[u8]>>(rows: &[R], polarity: Polarity) -> ScanBlock {
    let mut block = [0u8; SCAN_BLOCK_BYTES];

    for (line, row) in block.chunks_exact_mut(LINE_BYTES).zip(rows.iter()) {
        let row = row.as_ref();
        for (x, out) in line.iter_mut().enumerate() {
            if let Some(&byte) = row.get(LINE_BYTES - 1 - x) {
                *out = mirror_byte(polarity.apply(byte));
            }
        }
    }

    block
}
