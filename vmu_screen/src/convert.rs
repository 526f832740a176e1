/*!
Encode and decode pipelines.

Encode: bitmap container -> scan block -> framed words -> command text.
Decode: command text -> validated words -> scan block -> bitmap container.
Output files are written only once the whole conversion has succeeded.
*/

use anyhow::{Context, Result};
use screen_codec::{
    decode_frame, encode_frame, format_words, maple_addresses, parse_words, scan_block_from_words,
    scan_block_to_words, write_screen_bitmap, FormatTemplate, MonochromeBitmap, Polarity,
    DEFAULT_SCREEN_WORDS,
};
use std::path::Path;
use tracing::{debug, info};

use crate::config::{DecodeConfig, EncodeConfig};
use crate::raster;

/// Turn a parsed bitmap into command text
pub fn encode_bitmap(bitmap: &MonochromeBitmap, config: &EncodeConfig) -> screen_codec::Result<String> {
    let template = FormatTemplate::parse(&config.format)?;
    encode_with_template(bitmap, config, &template)
}

fn encode_with_template(
    bitmap: &MonochromeBitmap,
    config: &EncodeConfig,
    template: &FormatTemplate,
) -> screen_codec::Result<String> {
    let block = bitmap.to_scan_block(Polarity::from_invert_flag(config.invert));
    let words = encode_frame(&scan_block_to_words(&block), config.maple_index, config.screen_only)?;
    debug!("Encoded {} words", words.len());
    Ok(format_words(&words, config.output_endian, template))
}

/// Read an image file (bitmap or any format the image crate decodes) into command text
pub fn encode_image_file(path: &Path, config: &EncodeConfig) -> Result<String> {
    // Settings are checked before any file is read or written
    let template = FormatTemplate::parse(&config.format).context("Invalid output format")?;
    if !config.screen_only {
        maple_addresses(config.maple_index).context("Invalid maple index")?;
    }

    let bitmap = if raster::is_bitmap_path(path) {
        MonochromeBitmap::from_file(path)
            .with_context(|| format!("Failed to read bitmap: {}", path.display()))?
    } else {
        let bitmap = raster::load_as_bitmap(path, config.threshold)?;
        if config.keep_bitmap {
            let bitmap_path = path.with_extension("bmp");
            std::fs::write(&bitmap_path, bitmap.to_bytes()).with_context(|| {
                format!("Failed to write intermediate bitmap: {}", bitmap_path.display())
            })?;
            info!("Saved intermediate bitmap to {}", bitmap_path.display());
        }
        bitmap
    };

    encode_with_template(&bitmap, config, &template)
        .with_context(|| format!("Failed to encode {}", path.display()))
}

/// Turn command text into bitmap container bytes
pub fn decode_command(text: &str, config: &DecodeConfig) -> screen_codec::Result<Vec<u8>> {
    let words = parse_words(text, config.input_endian)?;
    debug!("Parsed {} words", words.len());
    let screen_words = decode_frame(&words, config.screen_only)?;
    let block = scan_block_from_words(&screen_words)?;
    write_screen_bitmap(&block, Polarity::from_invert_flag(config.invert))
}

/// Decode command text and write the bitmap to the configured output path
pub fn decode_to_file(text: &str, config: &DecodeConfig) -> Result<()> {
    let bytes = decode_command(text, config).context("Failed to decode screen command")?;
    std::fs::write(&config.output, bytes)
        .with_context(|| format!("Failed to write bitmap: {}", config.output.display()))?;
    info!("Wrote {}", config.output.display());
    Ok(())
}

/// Command text for the built-in default VMU icon
pub fn sample_command(config: &EncodeConfig) -> screen_codec::Result<String> {
    let template = FormatTemplate::parse(&config.format)?;
    let words = encode_frame(&DEFAULT_SCREEN_WORDS, config.maple_index, config.screen_only)?;
    Ok(format_words(&words, config.output_endian, &template))
}

/// Write the built-in default VMU icon as a bitmap
pub fn write_sample_bitmap(path: &Path, invert: bool) -> Result<()> {
    let block = scan_block_from_words(&DEFAULT_SCREEN_WORDS)?;
    let bytes = write_screen_bitmap(&block, Polarity::from_invert_flag(invert))?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write bitmap: {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use screen_codec::{CodecError, Endianness};

    fn zero_screen_text() -> String {
        let mut text = String::from("0C010032 00000004 00000000");
        for _ in 0..48 {
            text.push_str(" 00000000");
        }
        text
    }

    fn zero_scan_bitmap() -> MonochromeBitmap {
        let bytes = write_screen_bitmap(&[0u8; 192], Polarity::Flip).unwrap();
        MonochromeBitmap::parse(&bytes).unwrap()
    }

    #[test]
    fn test_zero_screen_encodes_to_framed_text() {
        let text = encode_bitmap(&zero_scan_bitmap(), &EncodeConfig::default()).unwrap();
        assert_eq!(text, zero_screen_text());
        assert_eq!(text.split(' ').count(), 51);
    }

    #[test]
    fn test_zero_screen_text_decodes_to_white_rows() {
        let bytes = decode_command(&zero_screen_text(), &DecodeConfig::default()).unwrap();
        assert_eq!(bytes.len(), 318);
        for row in bytes[62..].chunks_exact(8) {
            assert_eq!(&row[..6], &[0xFF; 6]);
            assert_eq!(&row[6..], &[0x00; 2]);
        }
    }

    #[test]
    fn test_sample_roundtrip_little_endian() {
        let encode = EncodeConfig {
            output_endian: Endianness::Little,
            maple_index: 1,
            ..EncodeConfig::default()
        };
        let text = sample_command(&encode).unwrap();
        assert!(text.starts_with("3240410C 04000000 00000000"));

        let decode = DecodeConfig {
            input_endian: Endianness::Little,
            ..DecodeConfig::default()
        };
        let bytes = decode_command(&text, &decode).unwrap();
        let block = MonochromeBitmap::parse(&bytes).unwrap().to_scan_block(Polarity::Flip);
        assert_eq!(scan_block_to_words(&block), DEFAULT_SCREEN_WORDS.to_vec());
    }

    #[test]
    fn test_sample_bitmap_matches_sample_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.bmp");
        write_sample_bitmap(&path, false).unwrap();

        let config = EncodeConfig::default();
        assert_eq!(
            encode_image_file(&path, &config).unwrap(),
            sample_command(&config).unwrap()
        );
    }

    #[test]
    fn test_screen_only_roundtrip_inverted() {
        let encode = EncodeConfig {
            screen_only: true,
            invert: true,
            ..EncodeConfig::default()
        };
        let text = sample_command(&encode).unwrap();
        assert_eq!(text.split(' ').count(), 48);

        let decode = DecodeConfig {
            screen_only: true,
            invert: true,
            ..DecodeConfig::default()
        };
        let bytes = decode_command(&text, &decode).unwrap();
        let bitmap = MonochromeBitmap::parse(&bytes).unwrap();
        assert_eq!(encode_bitmap(&bitmap, &encode).unwrap(), text);

        // A framed command is not a screen-only payload
        assert!(matches!(
            decode_command(&zero_screen_text(), &decode),
            Err(CodecError::InvalidWordCount { expected: 48, actual: 51 })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        let text = zero_screen_text().replacen("0C01", "0D01", 1);
        assert!(matches!(
            decode_command(&text, &DecodeConfig::default()),
            Err(CodecError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_file_roundtrip_and_no_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("screen.bmp");
        let decode = DecodeConfig {
            output: output.clone(),
            ..DecodeConfig::default()
        };

        let text = sample_command(&EncodeConfig::default()).unwrap();
        decode_to_file(&text, &decode).unwrap();
        assert_eq!(encode_image_file(&output, &EncodeConfig::default()).unwrap(), text);

        let bad = dir.path().join("bad.bmp");
        let decode = DecodeConfig {
            output: bad.clone(),
            ..DecodeConfig::default()
        };
        assert!(decode_to_file("0C010032", &decode).is_err());
        assert!(!bad.exists());
    }

    #[test]
    fn test_invalid_index_surfaces_through_anyhow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.bmp");
        std::fs::write(&path, write_screen_bitmap(&[0u8; 192], Polarity::Flip).unwrap()).unwrap();

        let config = EncodeConfig {
            maple_index: 4,
            ..EncodeConfig::default()
        };
        let err = encode_image_file(&path, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::InvalidIndex { field: "maple index", .. })
        ));
    }

    #[test]
    fn test_bad_settings_leave_no_intermediate_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("blank.png");
        image::GrayImage::from_pixel(48, 32, image::Luma([255])).save(&png).unwrap();
        let kept = dir.path().join("blank.bmp");

        let bad_index = EncodeConfig {
            keep_bitmap: true,
            maple_index: 4,
            ..EncodeConfig::default()
        };
        let err = encode_image_file(&png, &bad_index).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::InvalidIndex { field: "maple index", .. })
        ));
        assert!(!kept.exists());

        let bad_format = EncodeConfig {
            keep_bitmap: true,
            format: "%q".to_string(),
            ..EncodeConfig::default()
        };
        let err = encode_image_file(&png, &bad_format).unwrap_err();
        assert!(matches!(err.downcast_ref::<CodecError>(), Some(CodecError::InvalidTemplate(_))));
        assert!(!kept.exists());

        // Screen-only output carries no address, so any index is accepted
        let screen_only = EncodeConfig {
            keep_bitmap: true,
            maple_index: 4,
            screen_only: true,
            ..EncodeConfig::default()
        };
        assert_eq!(encode_image_file(&png, &screen_only).unwrap().split(' ').count(), 48);
        assert!(kept.is_file());
    }

    #[test]
    fn test_png_input_keeps_intermediate_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("blank.png");
        image::GrayImage::from_pixel(48, 32, image::Luma([255])).save(&png).unwrap();

        let config = EncodeConfig {
            keep_bitmap: true,
            ..EncodeConfig::default()
        };
        // All-white image with default polarity is all-zero on the wire
        assert_eq!(encode_image_file(&png, &config).unwrap(), zero_screen_text());
        assert!(dir.path().join("blank.bmp").is_file());
    }
}
