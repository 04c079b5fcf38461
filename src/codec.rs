//! # Image Codec
//!
//! Decode and encode collaborators for the compressor, backed by the `image` crate.
//!
//! - Inputs of any decodable format are normalized to 8-bit RGB (alpha is dropped,
//!   grayscale is expanded)
//! - Output is always baseline JPEG at a caller-chosen quality

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};
use svd_rank::rank::Dims;

use crate::error::{CompressError, CompressResult};

/// File extensions accepted as compression input.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Lowest quality the JPEG encoder is driven with.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Highest quality the JPEG encoder is driven with.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Returns true if `extension` (with or without the leading dot) is supported.
pub fn is_supported_extension(extension: &str) -> bool {
    let ext = extension.trim_start_matches('.');
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(ext))
}

/// Returns true if `filename` has a supported image extension.
///
/// ```rust
/// use svd_image_compress::codec::allowed_file;
///
/// assert!(allowed_file("holiday.JPG"));
/// assert!(!allowed_file("notes.txt"));
/// assert!(!allowed_file("png"));
/// ```
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| is_supported_extension(ext))
}

/// Decoded RGB8 image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: RgbImage,
}

impl DecodedImage {
    /// Dimensions as used by the decomposer.
    pub fn dims(&self) -> Dims {
        Dims {
            height: self.pixels.height() as usize,
            width: self.pixels.width() as usize,
        }
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }
}

/// Decode image bytes into RGB8.
///
/// # Errors
/// `InvalidInput` if the bytes cannot be decoded or the image has a zero dimension.
pub fn decode_rgb(bytes: &[u8]) -> CompressResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(CompressError::invalid_input("image data is empty").with_operation("decode"));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| CompressError::from(e).with_operation("decode"))?;
    let pixels = decoded.to_rgb8();

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(CompressError::invalid_input(format!(
            "image has zero dimension ({}x{})",
            pixels.height(),
            pixels.width()
        ))
        .with_operation("decode"));
    }

    Ok(DecodedImage { pixels })
}

/// Build an RGB image from interleaved samples.
pub fn rgb_from_samples(width: u32, height: u32, samples: Vec<u8>) -> CompressResult<RgbImage> {
    let expected = width as usize * height as usize * 3;
    let actual = samples.len();
    RgbImage::from_raw(width, height, samples).ok_or_else(|| {
        CompressError::decomposition(format!(
            "reconstruction has {} samples, expected {} for {}x{}",
            actual, expected, height, width
        ))
    })
}

/// Encode an RGB image as JPEG at `quality` (clamped to `1..=100`).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> CompressResult<Vec<u8>> {
    let quality = quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY);
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CompressError::encode(quality, e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, LumaA, Rgb};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn extension_filter() {
        assert!(is_supported_extension("png"));
        assert!(is_supported_extension(".JPEG"));
        assert!(!is_supported_extension("gif"));
        assert!(allowed_file("a.b.jpeg"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file("archive.tar.gz"));
    }

    #[test]
    fn decode_normalizes_alpha_to_rgb() {
        let gray_alpha = image::ImageBuffer::from_pixel(3, 2, LumaA([200u8, 10u8]));
        let decoded = decode_rgb(&png_bytes(DynamicImage::ImageLumaA8(gray_alpha))).unwrap();
        assert_eq!(decoded.dims(), Dims { height: 2, width: 3 });
        assert!(decoded.pixels.pixels().all(|p| *p == Rgb([200, 200, 200])));
    }

    #[test]
    fn decode_rejects_garbage_and_empty() {
        assert_eq!(decode_rgb(b"").unwrap_err().category(), "invalid_input");
        assert_eq!(
            decode_rgb(b"\x89PNG but not really").unwrap_err().category(),
            "invalid_input"
        );
    }

    #[test]
    fn jpeg_output_has_soi_marker_and_shrinks_with_quality() {
        let image = RgbImage::from_fn(64, 48, |x, y| {
            Rgb([(x * 4) as u8, (y * 5) as u8, ((x * y) % 256) as u8])
        });
        let high = encode_jpeg(&image, 95).unwrap();
        let low = encode_jpeg(&image, 10).unwrap();
        assert_eq!(&high[..2], &[0xFF, 0xD8]);
        assert!(low.len() < high.len());
        // quality 0 is clamped rather than rejected
        assert!(!encode_jpeg(&image, 0).unwrap().is_empty());
    }

    #[test]
    fn samples_must_match_dimensions() {
        assert!(rgb_from_samples(2, 2, vec![0; 12]).is_ok());
        assert_eq!(
            rgb_from_samples(2, 2, vec![0; 11]).unwrap_err().category(),
            "decomposition"
        );
    }
}
