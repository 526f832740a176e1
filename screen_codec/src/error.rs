/*!
Common error types for the screen codec.
*/

use thiserror::Error;

/// Common result type used throughout the codec library
pub type Result<T> = std::result::Result<T, CodecError>;

/// Every way a conversion can fail
#[derive(Error, Debug)]
pub enum CodecError {
    /// Bad characters or length in command text
    #[error("Malformed hex input: {0}")]
    MalformedHex(String),

    /// A fixed header field does not carry its fixed value
    #[error(
        "Malformed frame: {field} is 0x{actual:08X}, expected 0x{expected:08X} (mask 0x{mask:08X})"
    )]
    MalformedFrame {
        field: &'static str,
        expected: u32,
        mask: u32,
        actual: u32,
    },

    /// Wrong number of words for a framed or screen-only command
    #[error("Expecting exactly {expected} words; given {actual}")]
    InvalidWordCount { expected: usize, actual: usize },

    /// Player index or endianness token out of range
    #[error("Invalid {field}: {value} (expected {expected})")]
    InvalidIndex {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Container ends inside the file header or palette region
    #[error("Bitmap header truncated: need {required} bytes, found {available}")]
    TruncatedHeader { required: usize, available: usize },

    /// Container ends before the declared end of the DIB header
    #[error("Bitmap DIB header truncated: need {required} bytes, found {available}")]
    TruncatedDibHeader { required: usize, available: usize },

    /// Container row data holds fewer bits than width * height
    #[error("Bitmap image data truncated: need {required_bits} bits, found {available_bits}")]
    TruncatedImageData {
        required_bits: u64,
        available_bits: u64,
    },

    /// Screen payload is not exactly one scan block
    #[error("Invalid screen payload length: expected {expected} bytes, got {actual}")]
    InvalidPayloadLength { expected: usize, actual: usize },

    /// Output format template cannot format one word
    #[error("Invalid format template: {0}")]
    InvalidTemplate(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Create a new malformed hex error
    pub fn malformed_hex(msg: impl Into<String>) -> Self {
        Self::MalformedHex(msg.into())
    }

    /// Create a new invalid template error
    pub fn invalid_template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }

    /// Create a new invalid payload length error against the scan block size
    pub fn payload_length(actual: usize) -> Self {
        Self::InvalidPayloadLength {
            expected: crate::protocol::SCAN_BLOCK_BYTES,
            actual,
        }
    }
}
