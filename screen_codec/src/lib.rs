/*!
# VMU Screen Codec

Bit-level conversion between the Dreamcast VMU LCD block-write command and a
minimal 1-bit bitmap container.

## Core Types

- [`ScanBlock`] - 192 payload bytes in device scan order
- [`ScreenRows`] - 32 rows of 6 bytes in bitmap row order
- [`MonochromeBitmap`] - parsed/emittable 1-bit bitmap container
- [`FormatTemplate`] - per-byte output template for command text

## Modules

- [`remap`] - byte mirroring and scan-order remapping
- [`frame`] - command frame header building and validation
- [`bitmap`] - bitmap container parsing and emission
- [`words`] - hex text parsing and formatting
- [`error`] - common error types
*/

pub mod bitmap;
pub mod error;
pub mod frame;
pub mod remap;
pub mod words;

// Re-export commonly used types
pub use bitmap::{write_screen_bitmap, MonochromeBitmap};
pub use error::{CodecError, Result};
pub use frame::{
    decode_frame, decode_frame_header, encode_frame, maple_addresses, scan_block_from_words,
    scan_block_to_words, FrameHeader, DEFAULT_SCREEN_WORDS,
};
pub use remap::{mirror_byte, rows_to_scan, scan_to_rows, Polarity, ScanBlock, ScreenRows};
pub use words::{format_words, parse_words, Endianness, FormatTemplate};

/// Version information for the codec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    /// Screen width in pixels
    pub const SCREEN_WIDTH: u32 = 48;

    /// Screen height in pixels
    pub const SCREEN_HEIGHT: u32 = 32;

    /// Bytes in one device scan line (48 pixels / 8)
    pub const LINE_BYTES: usize = 6;

    /// Number of scan lines
    pub const LINE_COUNT: usize = 32;

    /// Size of the device scan block in bytes
    pub const SCAN_BLOCK_BYTES: usize = LINE_BYTES * LINE_COUNT;

    /// Size of a word in bytes
    pub const WORD_BYTES: usize = 4;

    /// Number of words carrying screen data
    pub const SCREEN_WORDS: usize = SCAN_BLOCK_BYTES / WORD_BYTES;

    /// Number of header words preceding the screen data in a framed command
    pub const HEADER_WORDS: usize = 3;

    /// Total words in a framed command
    pub const FRAME_WORDS: usize = HEADER_WORDS + SCREEN_WORDS;

    /// Maple block-write command code
    pub const COMMAND_BLOCK_WRITE: u8 = 0x0C;

    /// Payload length in words announced by the frame (function code + write address + screen)
    pub const PAYLOAD_WORD_COUNT: u8 = (SCREEN_WORDS + 2) as u8;

    /// Function code selecting the LCD
    pub const FUNCTION_LCD: u32 = 0x0000_0004;

    /// Block write address (partition 0, sequence 0, block 0)
    pub const WRITE_ADDRESS: u32 = 0x0000_0000;

    /// Host address of each maple/player port
    pub const HOST_ADDRESSES: [u8; 4] = [0x00, 0x40, 0x80, 0xC0];

    /// Bit selecting the first sub-peripheral slot (where the VMU lives)
    pub const SUB_PERIPHERAL_1: u8 = 0x01;
}
