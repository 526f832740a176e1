/*!
Command frame building and validation.

A framed screen command is 51 words: a 3-word block-write header followed by
the 48 words of the device scan block. The header layout lives in
[`HEADER_FIELDS`] so that building and validating read the same table.
*/

use crate::error::{CodecError, Result};
use crate::protocol::{
    COMMAND_BLOCK_WRITE, FRAME_WORDS, FUNCTION_LCD, HEADER_WORDS, HOST_ADDRESSES,
    PAYLOAD_WORD_COUNT, SCREEN_WORDS, SUB_PERIPHERAL_1, WORD_BYTES, WRITE_ADDRESS,
};
use crate::remap::ScanBlock;
use tracing::debug;

/// One fixed field of the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub name: &'static str,
    /// Word position within the frame
    pub index: usize,
    /// Bits that must carry `value`; the rest are free
    pub mask: u32,
    pub value: u32,
}

impl HeaderField {
    /// Check a word against this field
    pub fn check(&self, word: u32) -> Result<()> {
        if word & self.mask != self.value {
            return Err(CodecError::MalformedFrame {
                field: self.name,
                expected: self.value,
                mask: self.mask,
                actual: word,
            });
        }
        Ok(())
    }
}

/// Fixed header layout. The address bytes of the first word are free.
pub const HEADER_FIELDS: [HeaderField; HEADER_WORDS] = [
    HeaderField {
        name: "command word",
        index: 0,
        mask: 0xFF00_00FF,
        value: (COMMAND_BLOCK_WRITE as u32) << 24 | PAYLOAD_WORD_COUNT as u32,
    },
    HeaderField {
        name: "function code word",
        index: 1,
        mask: u32::MAX,
        value: FUNCTION_LCD,
    },
    HeaderField {
        name: "write address word",
        index: 2,
        mask: u32::MAX,
        value: WRITE_ADDRESS,
    },
];

/// Address pair carried in the first header word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Device (recipient) address
    pub destination: u8,
    /// Host (sender) address
    pub source: u8,
}

impl FrameHeader {
    /// Header addressed to the VMU in the given maple/player port
    pub fn for_maple_index(maple_index: usize) -> Result<Self> {
        let (destination, source) = maple_addresses(maple_index)?;
        Ok(Self {
            destination,
            source,
        })
    }

    /// Extract the address pair from a command word
    pub fn from_command_word(word: u32) -> Self {
        let [_, destination, source, _] = word.to_be_bytes();
        Self {
            destination,
            source,
        }
    }

    /// Build the three header words
    pub fn to_words(&self) -> [u32; HEADER_WORDS] {
        let mut words = HEADER_FIELDS.map(|field| field.value);
        words[0] |= (self.destination as u32) << 16 | (self.source as u32) << 8;
        words
    }
}

/// Default VMU screen (a small VMU icon) shown before any host data arrives
pub const DEFAULT_SCREEN_WORDS: [u32; SCREEN_WORDS] = [
    0x0000FFFF, 0x00000003, 0x8001C000, 0x00060000, 0x6000000C, 0x00003000, 0x0008000C, 0x10000009,
    0xDC0C1000, 0x0009DC3F, 0x10000009, 0xDC3F1000, 0x0008000C, 0x10000008, 0x360C1000, 0x00083600,
    0x10000008, 0x00001000, 0x00080000, 0x10000008, 0x7FFE1000, 0x0008FFFF, 0x10000008, 0xFFFF1000,
    0x0008FFFF, 0x10000008, 0xFFFF1000, 0x0008FFFF, 0x10000008, 0xFFFF1000, 0x0008FFFF, 0x10000008,
    0xFFFF1000, 0x0008FFFF, 0x10000008, 0xFFFF1000, 0x0008FFFF, 0x10000008, 0xFFFF1000, 0x0008FFFF,
    0x10000008, 0x7FFE1000, 0x000C0000, 0x30000006, 0x00006000, 0x00038001, 0xC0000000, 0xFFFF0000,
];

/// Return `(device, host)` addresses for a maple/player index in `0..=3`
pub fn maple_addresses(maple_index: usize) -> Result<(u8, u8)> {
    let host = *HOST_ADDRESSES
        .get(maple_index)
        .ok_or_else(|| CodecError::InvalidIndex {
            field: "maple index",
            value: maple_index.to_string(),
            expected: "0..=3",
        })?;
    Ok((host | SUB_PERIPHERAL_1, host))
}

/// Validate the header of a framed command and return its address pair
pub fn decode_frame_header(words: &[u32]) -> Result<FrameHeader> {
    if words.len() != FRAME_WORDS {
        return Err(CodecError::InvalidWordCount {
            expected: FRAME_WORDS,
            actual: words.len(),
        });
    }

    for field in &HEADER_FIELDS {
        field.check(words[field.index])?;
    }

    Ok(FrameHeader::from_command_word(words[0]))
}

/// Strip and validate the frame, returning the 48 screen words.
///
/// With `screen_only` the input must already be exactly the 48 screen words.
pub fn decode_frame(words: &[u32], screen_only: bool) -> Result<Vec<u32>> {
    if screen_only {
        if words.len() != SCREEN_WORDS {
            return Err(CodecError::InvalidWordCount {
                expected: SCREEN_WORDS,
                actual: words.len(),
            });
        }
        return Ok(words.to_vec());
    }

    let header = decode_frame_header(words)?;
    debug!(
        "Frame header: destination 0x{:02X}, source 0x{:02X}",
        header.destination, header.source
    );

    Ok(words[HEADER_WORDS..].to_vec())
}

/// Wrap 48 screen words in a block-write frame for the given maple/player index.
///
/// With `screen_only` the screen words are returned unwrapped and the index is
/// not consulted.
pub fn encode_frame(screen_words: &[u32], maple_index: usize, screen_only: bool) -> Result<Vec<u32>> {
    if screen_words.len() != SCREEN_WORDS {
        return Err(CodecError::payload_length(screen_words.len() * WORD_BYTES));
    }

    if screen_only {
        return Ok(screen_words.to_vec());
    }

    let header = FrameHeader::for_maple_index(maple_index)?;
    let mut words = Vec::with_capacity(FRAME_WORDS);
    words.extend_from_slice(&header.to_words());
    words.extend_from_slice(screen_words);
    Ok(words)
}

/// Serialize 48 screen words (big-endian) into a scan block
pub fn scan_block_from_words(words: &[u32]) -> Result<ScanBlock> {
    if words.len() != SCREEN_WORDS {
        return Err(CodecError::payload_length(words.len() * WORD_BYTES));
    }

    let mut block = [0u8; crate::protocol::SCAN_BLOCK_BYTES];
    for (chunk, word) in block.chunks_exact_mut(WORD_BYTES).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    Ok(block)
}

/// Split a scan block into 48 big-endian words
pub fn scan_block_to_words(block: &ScanBlock) -> Vec<u32> {
    block
        .chunks_exact(WORD_BYTES)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
