//! Image size bounding before OCR
//!
//! Phone photos of slips are often 4000px tall; OCR time and memory grow
//! with pixel count while legibility stops improving well below that.

use std::borrow::Cow;
use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};
use tracing::debug;

use crate::error::Result;

const JPEG_QUALITY: u8 = 90;

/// Downscale so the longest side is at most `max_dimension`
///
/// Aspect ratio is preserved. PNG and JPEG keep their format; anything else
/// is re-encoded as JPEG. Images within bounds, and bytes that do not
/// decode, are returned untouched.
pub fn bound_dimensions(image: &[u8], max_dimension: u32) -> Cow<'_, [u8]> {
    match downscale(image, max_dimension) {
        Ok(Some(resized)) => Cow::Owned(resized),
        Ok(None) => Cow::Borrowed(image),
        Err(e) => {
            debug!("Image not decodable, passing to OCR unchanged: {}", e);
            Cow::Borrowed(image)
        }
    }
}

fn downscale(image: &[u8], max_dimension: u32) -> Result<Option<Vec<u8>>> {
    let format = image::guess_format(image).ok();
    let img = image::load_from_memory(image)?;
    let (width, height) = img.dimensions();

    if width.max(height) <= max_dimension {
        return Ok(None);
    }

    let resized = img.thumbnail(max_dimension, max_dimension);
    debug!(
        "Downscaled {}x{} to {}x{}",
        width,
        height,
        resized.width(),
        resized.height()
    );

    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    match format {
        Some(ImageFormat::Png) => resized.write_to(&mut cursor, ImageOutputFormat::Png)?,
        _ => DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_to(&mut cursor, ImageOutputFormat::Jpeg(JPEG_QUALITY))?,
    }

    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn test_oversized_png_keeps_format_and_aspect() {
        let png = encode(2000, 1000, ImageOutputFormat::Png);
        let out = bound_dimensions(&png, 1600);

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (1600, 800));
    }

    #[test]
    fn test_oversized_jpeg_stays_jpeg() {
        let jpeg = encode(900, 1800, ImageOutputFormat::Jpeg(80));
        let out = bound_dimensions(&jpeg, 1600);

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (800, 1600));
    }

    #[test]
    fn test_other_formats_normalized_to_jpeg() {
        let bmp = encode(400, 200, ImageOutputFormat::Bmp);
        let out = bound_dimensions(&bmp, 100);
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_small_or_undecodable_images_untouched() {
        let png = encode(100, 50, ImageOutputFormat::Png);
        assert!(matches!(bound_dimensions(&png, 1600), Cow::Borrowed(_)));

        let garbage = b"not an image".to_vec();
        assert_eq!(bound_dimensions(&garbage, 1600).as_ref(), garbage.as_slice());
    }
}
