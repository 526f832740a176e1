/*!
Conversion of arbitrary image files into a 1-bit bitmap container.

Only used on the encode path when the input is not already a `.bmp`. The
image is reduced to luma and thresholded; rows are stored bottom-up as a
standard bitmap file stores them, so the result reads exactly like a `.bmp`
saved by an image editor.
*/

use anyhow::{Context, Result};
use screen_codec::MonochromeBitmap;
use std::path::Path;
use tracing::debug;

/// Whether the path already names a bitmap container
pub fn is_bitmap_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bmp"))
}

/// Decode any supported image and threshold it into a monochrome bitmap
pub fn load_as_bitmap(path: &Path, threshold: u8) -> Result<MonochromeBitmap> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    debug!("Loaded {}x{} image from {}", width, height, path.display());

    let mut bitmap = MonochromeBitmap::new(width, height);
    for (x, y, pixel) in luma.enumerate_pixels() {
        bitmap.set_pixel(x, height - 1 - y, pixel[0] >= threshold);
    }

    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::path::PathBuf;

    #[test]
    fn test_bitmap_extension() {
        assert!(is_bitmap_path(&PathBuf::from("screen.bmp")));
        assert!(is_bitmap_path(&PathBuf::from("SCREEN.BMP")));
        assert!(!is_bitmap_path(&PathBuf::from("screen.png")));
        assert!(!is_bitmap_path(&PathBuf::from("screen")));
    }

    #[test]
    fn test_png_is_thresholded_bottom_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");

        // White top-left pixel, mid-grey top-right, everything else black
        let mut image = GrayImage::from_pixel(48, 32, Luma([0]));
        image.put_pixel(0, 0, Luma([255]));
        image.put_pixel(47, 0, Luma([100]));
        image.save(&path).unwrap();

        let bitmap = load_as_bitmap(&path, 128).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (48, 32));
        assert!(bitmap.pixel(0, 31));
        assert!(!bitmap.pixel(47, 31));
        assert!(!bitmap.pixel(0, 0));

        let bitmap = load_as_bitmap(&path, 100).unwrap();
        assert!(bitmap.pixel(47, 31));
    }

    #[test]
    fn test_missing_image_reports_path() {
        let err = load_as_bitmap(Path::new("does-not-exist.png"), 128).unwrap_err();
        assert!(format!("{err:#}").contains("does-not-exist.png"));
    }
}
