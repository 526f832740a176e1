/*!
Minimal 1-bit bitmap container.

The container is a 14-byte file header, a 40-byte DIB info header, an 8-byte
two-entry palette (black, white) and the row data, each row padded to a 4-byte
boundary. Every header field is listed in [`CONTAINER_FIELDS`]; the writer
emits exactly that table and the reader takes the dimensions from the same
entries.

Rows are kept in the order they are stored in the file. Dimensions other than
48x32 are accepted: extra rows and bytes are ignored and missing ones are
zero-filled when converting to a scan block.
*/

use crate::error::{CodecError, Result};
use crate::protocol::{LINE_COUNT, SCAN_BLOCK_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::remap::{rows_to_scan, scan_to_rows, Polarity, ScanBlock, ScreenRows};
use std::path::Path;
use tracing::{debug, warn};

/// Size of the file header
pub const FILE_HEADER_BYTES: usize = 14;

/// Size of the DIB info header written by this codec
pub const DIB_HEADER_BYTES: usize = 40;

/// Palette entries: index 0 black, index 1 white
pub const PALETTE: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x00];

/// Offset of the first row of pixel data
pub const DATA_OFFSET: usize = FILE_HEADER_BYTES + DIB_HEADER_BYTES + PALETTE.len();

/// Pixels per metre written into both resolution fields (72 dpi)
const PIXELS_PER_METRE: u32 = 0x0B12;

/// DIB bytes needed to reach the end of the height field
const DIB_DIMENSION_BYTES: usize = 12;

/// How a header field gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Fixed(u32),
    FileSize,
    Width,
    Height,
    ImageSize,
}

/// One little-endian header field at an absolute file offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerField {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub value: FieldValue,
}

const fn field(name: &'static str, offset: usize, width: usize, value: FieldValue) -> ContainerField {
    ContainerField {
        name,
        offset,
        width,
        value,
    }
}

/// Width field (DIB offset 4)
pub const WIDTH_FIELD: ContainerField = field("width", 18, 4, FieldValue::Width);

/// Height field (DIB offset 8)
pub const HEIGHT_FIELD: ContainerField = field("height", 22, 4, FieldValue::Height);

/// File header followed by DIB info header, in file order
pub const CONTAINER_FIELDS: [ContainerField; 15] = [
    field("signature", 0, 2, FieldValue::Fixed(u16::from_le_bytes(*b"BM") as u32)),
    field("file size", 2, 4, FieldValue::FileSize),
    field("reserved", 6, 4, FieldValue::Fixed(0)),
    field("data offset", 10, 4, FieldValue::Fixed(DATA_OFFSET as u32)),
    field("DIB header size", 14, 4, FieldValue::Fixed(DIB_HEADER_BYTES as u32)),
    WIDTH_FIELD,
    HEIGHT_FIELD,
    field("planes", 26, 2, FieldValue::Fixed(1)),
    field("bits per pixel", 28, 2, FieldValue::Fixed(1)),
    field("compression", 30, 4, FieldValue::Fixed(0)),
    field("image size", 34, 4, FieldValue::ImageSize),
    field("horizontal resolution", 38, 4, FieldValue::Fixed(PIXELS_PER_METRE)),
    field("vertical resolution", 42, 4, FieldValue::Fixed(PIXELS_PER_METRE)),
    field("colors used", 46, 4, FieldValue::Fixed(0)),
    field("important colors", 50, 4, FieldValue::Fixed(0)),
];

/// Bytes per stored row: whole bytes for `width` bits, padded to a multiple of 4
pub fn row_stride(width: u32) -> usize {
    (width as usize).div_ceil(8).next_multiple_of(4)
}

/// A 1-bit bitmap container and its row data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonochromeBitmap {
    width: u32,
    height: u32,
    /// Row data as stored, first stored row first
    data: Vec<u8>,
}

impl MonochromeBitmap {
    /// Create an all-black bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; row_stride(width) * height as usize],
        }
    }

    /// Create a 48x32 bitmap from screen rows
    pub fn from_screen_rows(rows: &ScreenRows) -> Self {
        let mut bitmap = Self::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        let stride = bitmap.stride();
        for (dst, src) in bitmap.data.chunks_exact_mut(stride).zip(rows) {
            dst[..src.len()].copy_from_slice(src);
        }
        bitmap
    }

    /// Parse a container.
    ///
    /// The DIB header size is taken from its low byte only, and the row data
    /// is everything after the 8-byte palette region.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FILE_HEADER_BYTES {
            return Err(CodecError::TruncatedHeader {
                required: FILE_HEADER_BYTES,
                available: bytes.len(),
            });
        }

        let declared = match bytes.get(FILE_HEADER_BYTES) {
            Some(&size) => size as usize,
            None => {
                return Err(CodecError::TruncatedDibHeader {
                    required: DIB_DIMENSION_BYTES,
                    available: 0,
                })
            }
        };
        let dib_len = declared.max(DIB_DIMENSION_BYTES);
        let dib_end = FILE_HEADER_BYTES + dib_len;
        if bytes.len() < dib_end {
            return Err(CodecError::TruncatedDibHeader {
                required: dib_len,
                available: bytes.len() - FILE_HEADER_BYTES,
            });
        }

        let width = read_le(bytes, &WIDTH_FIELD);
        let height = read_le(bytes, &HEIGHT_FIELD);

        let data_start = dib_end + PALETTE.len();
        if bytes.len() < data_start {
            return Err(CodecError::TruncatedHeader {
                required: data_start,
                available: bytes.len(),
            });
        }

        let data = &bytes[data_start..];
        let required_bits = width as u64 * height as u64;
        let available_bits = data.len() as u64 * 8;
        if available_bits < required_bits {
            return Err(CodecError::TruncatedImageData {
                required_bits,
                available_bits,
            });
        }

        debug!(
            "Parsed bitmap: {}x{}, DIB header {} bytes, {} data bytes",
            width,
            height,
            declared,
            data.len()
        );

        Ok(Self {
            width,
            height,
            data: data.to_vec(),
        })
    }

    /// Load a container from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per stored row
    pub fn stride(&self) -> usize {
        row_stride(self.width)
    }

    /// Stored row `index`, cut short if the data ends early
    pub fn row(&self, index: usize) -> &[u8] {
        let stride = self.stride();
        let start = (index * stride).min(self.data.len());
        let end = (start + stride).min(self.data.len());
        &self.data[start..end]
    }

    /// Exactly 32 rows for the remapper: stored rows first, then empty rows
    pub fn scan_rows(&self) -> Vec<&[u8]> {
        let stored = (self.height as usize).min(LINE_COUNT);
        let mut rows: Vec<&[u8]> = (0..stored).map(|i| self.row(i)).collect();
        rows.resize(LINE_COUNT, &[]);
        rows
    }

    /// Read the pixel at column `x` of stored row `y` (`true` = palette white)
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        let byte = self.row(y as usize).get(x as usize / 8).copied().unwrap_or(0);
        byte & (0x80 >> (x % 8)) != 0
    }

    /// Set the pixel at column `x` of stored row `y`; out-of-range is ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, white: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.stride() + x as usize / 8;
        let mask = 0x80 >> (x % 8);
        if white {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }

    /// Remap the stored rows into a device scan block
    pub fn to_scan_block(&self, polarity: Polarity) -> ScanBlock {
        if self.width != SCREEN_WIDTH || self.height != SCREEN_HEIGHT {
            warn!(
                "Bitmap is {}x{}, expected {}x{}; rows are truncated or zero-padded",
                self.width, self.height, SCREEN_WIDTH, SCREEN_HEIGHT
            );
        }
        rows_to_scan(&self.scan_rows(), polarity)
    }

    /// Serialize the container
    pub fn to_bytes(&self) -> Vec<u8> {
        let image_size = self.stride() * self.height as usize;
        let file_size = DATA_OFFSET + image_size;

        let mut out = vec![0u8; DATA_OFFSET];
        for field in &CONTAINER_FIELDS {
            let value = match field.value {
                FieldValue::Fixed(value) => value,
                FieldValue::FileSize => file_size as u32,
                FieldValue::Width => self.width,
                FieldValue::Height => self.height,
                FieldValue::ImageSize => image_size as u32,
            };
            let bytes = value.to_le_bytes();
            out[field.offset..field.offset + field.width].copy_from_slice(&bytes[..field.width]);
        }
        out[FILE_HEADER_BYTES + DIB_HEADER_BYTES..].copy_from_slice(&PALETTE);

        out.extend_from_slice(&self.data[..image_size.min(self.data.len())]);
        out.resize(file_size, 0);
        out
    }
}

/// Read a little-endian field that is known to be in bounds
fn read_le(bytes: &[u8], field: &ContainerField) -> u32 {
    let mut buf = [0u8; 4];
    buf[..field.width].copy_from_slice(&bytes[field.offset..field.offset + field.width]);
    u32::from_le_bytes(buf)
}

/// Convert a 192-byte scan block into a complete 48x32 container
pub fn write_screen_bitmap(scan_bytes: &[u8], polarity: Polarity) -> Result<Vec<u8>> {
    let block: &ScanBlock = scan_bytes
        .try_into()
        .map_err(|_| CodecError::payload_length(scan_bytes.len()))?;
    let rows = scan_to_rows(block, polarity);
    Ok(MonochromeBitmap::from_screen_rows(&rows).to_bytes())
}
