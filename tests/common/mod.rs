//! Common test utilities and helpers for the compression library tests
//!
//! Synthetic images, encoders for building inputs, and shared assertions.

#![allow(dead_code)]

/// Synthetic test images
pub mod test_images {
    use image::{Rgb, RgbImage};

    /// Horizontal/vertical gradient with a constant blue channel
    pub fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            Rgb([r, g, 128])
        })
    }

    /// Black/white checkerboard with square cells
    pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    /// Gradient with per-pixel pseudo-random noise; compresses poorly as PNG
    pub fn textured(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        let base = gradient(width, height);
        RgbImage::from_fn(width, height, |x, y| {
            let Rgb([r, g, b]) = *base.get_pixel(x, y);
            let mut jitter = || {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 57) as i16) - 64
            };
            Rgb([
                (r as i16 + jitter()).clamp(0, 255) as u8,
                (g as i16 + jitter()).clamp(0, 255) as u8,
                (b as i16 + jitter()).clamp(0, 255) as u8,
            ])
        })
    }
}

/// Encoding helpers for building compressor inputs
pub mod encode {
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
        dynamic_png_bytes(&DynamicImage::ImageRgb8(image.clone()))
    }

    pub fn dynamic_png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .expect("PNG encoding of test image");
        buffer.into_inner()
    }

    pub fn jpeg_bytes(image: &RgbImage, quality: u8) -> Vec<u8> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(image)
            .expect("JPEG encoding of test image");
        buffer
    }
}

/// Custom assertions for testing
pub mod assertions {
    use image::ImageFormat;
    use svd_image_compress::CompressionResult;

    /// Assert the buffer is a decodable JPEG with the given dimensions
    pub fn assert_jpeg_with_dims(bytes: &[u8], height: u32, width: u32) {
        assert!(!bytes.is_empty(), "output buffer is empty");
        assert_eq!(
            image::guess_format(bytes).expect("recognizable format"),
            ImageFormat::Jpeg
        );
        let decoded = image::load_from_memory(bytes).expect("output decodes");
        assert_eq!(
            (decoded.height(), decoded.width()),
            (height, width),
            "decoded output has wrong dimensions"
        );
    }

    /// Assert the reported metrics are consistent with the buffer
    pub fn assert_consistent(result: &CompressionResult, input_len: usize) {
        assert_eq!(result.before_size, input_len as u64);
        assert_eq!(result.after_size, result.output_bytes.len() as u64);
        assert_eq!(result.size_reduced(), result.after_size < result.before_size);
    }
}
