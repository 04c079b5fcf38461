//! # Size-Constrained Encoder Search
//!
//! Truncating singular values does not by itself make the serialized file smaller:
//! a low-rank reconstruction can re-encode larger than an already well-compressed
//! original. This module closes that gap by walking the JPEG quality down until the
//! output fits under the original size.
//!
//! ## Search
//!
//! 1. Pick a starting quality from the size/ratio table ([`initial_quality`])
//! 2. Encode; if the result is strictly smaller than the original, accept it
//! 3. Otherwise step the quality down ([`next_quality`]) and retry, up to
//!    `max_attempts` encodes or until the floor is reached
//! 4. If nothing fit, encode once more at the emergency quality and accept that
//!    unconditionally
//!
//! The search always terminates after at most `max_attempts + 1` encodes and always
//! returns a non-empty buffer. A result that is still not smaller is reported through
//! [`SearchOutcome::converged`], never as an error.

use image::RgbImage;
use tracing::{debug, warn};

use crate::codec::encode_jpeg;
use crate::error::{CompressError, CompressResult};
use crate::processing::quality::{initial_quality, next_quality};

/// Lossy encoder with a quality knob.
///
/// Implement this trait to drive the search with another codec.
pub trait QualityEncoder {
    /// Serialize `image` at `quality` (1–100).
    fn encode(&self, image: &RgbImage, quality: u8) -> CompressResult<Vec<u8>>;
}

/// JPEG encoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegQualityEncoder;

impl QualityEncoder for JpegQualityEncoder {
    fn encode(&self, image: &RgbImage, quality: u8) -> CompressResult<Vec<u8>> {
        encode_jpeg(image, quality)
    }
}

/// Limits of the encoder search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of encodes in the descent (the fallback encode is extra)
    pub max_attempts: u32,
    /// Quality used for the unconditional fallback encode
    pub emergency_quality: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            emergency_quality: 15,
        }
    }
}

impl SearchConfig {
    /// Check the limits are usable.
    pub fn validate(&self) -> CompressResult<()> {
        if self.max_attempts == 0 {
            return Err(CompressError::validation(
                "max_attempts",
                "must be at least 1",
                self.max_attempts.to_string(),
            ));
        }
        if !(1..=100).contains(&self.emergency_quality) {
            return Err(CompressError::validation(
                "emergency_quality",
                "must be between 1 and 100",
                self.emergency_quality.to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of one encoder search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Serialized image
    pub buffer: Vec<u8>,
    /// `buffer.len()` in bytes
    pub final_size: u64,
    /// Quality the accepted buffer was encoded at
    pub quality_used: u8,
    /// Quality the descent started from
    pub initial_quality: u8,
    /// Number of encodes in the descent, excluding the fallback
    pub attempts: u32,
    /// True when the buffer is strictly smaller than the original
    pub converged: bool,
    /// True when the emergency fallback produced the buffer
    pub fallback: bool,
}

/// Encode `image` so that the result is smaller than `original_size`, if possible.
///
/// # Arguments
/// * `encoder` - Lossy encoder to drive
/// * `image` - Rank-`k` reconstruction
/// * `original_size` - Byte size of the original file
/// * `info_preserved` - `k / min(height, width)`
/// * `extension_hint` - Extension of the original file; output is JPEG regardless
/// * `config` - Attempt budget and fallback quality
///
/// # Errors
/// Only encoder failures are errors. Failing to get below `original_size` is not.
pub fn encode_under_budget<E: QualityEncoder + ?Sized>(
    encoder: &E,
    image: &RgbImage,
    original_size: u64,
    info_preserved: f64,
    extension_hint: &str,
    config: &SearchConfig,
) -> CompressResult<SearchOutcome> {
    config.validate()?;

    let start_quality = initial_quality(original_size, info_preserved);
    debug!(
        original_size,
        info_preserved,
        start_quality,
        input_format = extension_hint,
        "starting encoder search"
    );

    let mut quality = start_quality;
    let mut attempts = 0;

    while attempts < config.max_attempts {
        let buffer = encoder.encode(image, quality)?;
        attempts += 1;

        let size = buffer.len() as u64;
        debug!(
            attempt = attempts,
            quality,
            size,
            reduction_pct = reduction_percent(original_size, size),
            "encoder search attempt"
        );

        if size < original_size {
            return Ok(SearchOutcome {
                buffer,
                final_size: size,
                quality_used: quality,
                initial_quality: start_quality,
                attempts,
                converged: true,
                fallback: false,
            });
        }

        match next_quality(quality) {
            Some(next) => quality = next,
            None => break,
        }
    }

    let quality = config.emergency_quality;
    let buffer = encoder.encode(image, quality)?;
    let size = buffer.len() as u64;
    let converged = size < original_size;

    debug!(quality, size, "emergency fallback encode");
    if !converged {
        warn!(
            original_size,
            final_size = size,
            "could not achieve size reduction"
        );
    }

    Ok(SearchOutcome {
        buffer,
        final_size: size,
        quality_used: quality,
        initial_quality: start_quality,
        attempts,
        converged,
        fallback: true,
    })
}

fn reduction_percent(original: u64, size: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - size as f64) / original as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::cell::RefCell;

    /// Encoder whose output size is a fixed function of quality.
    struct SizedByQuality {
        bytes_per_quality: usize,
        calls: RefCell<Vec<u8>>,
    }

    impl SizedByQuality {
        fn new(bytes_per_quality: usize) -> Self {
            Self {
                bytes_per_quality,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl QualityEncoder for SizedByQuality {
        fn encode(&self, _image: &RgbImage, quality: u8) -> CompressResult<Vec<u8>> {
            self.calls.borrow_mut().push(quality);
            Ok(vec![0xAB; quality as usize * self.bytes_per_quality])
        }
    }

    struct Failing;

    impl QualityEncoder for Failing {
        fn encode(&self, _image: &RgbImage, quality: u8) -> CompressResult<Vec<u8>> {
            Err(CompressError::encode(quality, "disk full"))
        }
    }

    fn image() -> RgbImage {
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
    }

    #[test]
    fn accepts_first_attempt_that_fits() {
        let encoder = SizedByQuality::new(100);
        // small file, full ratio → starts at 85; 85*100 = 8500 ≥ 6000, 75 → 7500, 65 → 6500, 55 → 5500
        let outcome =
            encode_under_budget(&encoder, &image(), 6_000, 1.0, "png", &SearchConfig::default())
                .unwrap();
        assert!(outcome.converged);
        assert!(!outcome.fallback);
        assert_eq!(outcome.quality_used, 55);
        assert_eq!(outcome.initial_quality, 85);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.final_size, 5_500);
        assert_eq!(*encoder.calls.borrow(), vec![85, 75, 65, 55]);
    }

    #[test]
    fn exhausted_budget_falls_back_to_emergency_quality() {
        let encoder = SizedByQuality::new(1_000);
        let outcome =
            encode_under_budget(&encoder, &image(), 10, 0.1, "jpg", &SearchConfig::default())
                .unwrap();

        assert!(!outcome.converged);
        assert!(outcome.fallback);
        assert_eq!(outcome.attempts, 8);
        assert_eq!(outcome.quality_used, 15);
        assert!(!outcome.buffer.is_empty());
        // small file, ratio < 0.2 → 55 down the schedule, then the fallback
        assert_eq!(
            *encoder.calls.borrow(),
            vec![55, 45, 35, 25, 20, 18, 16, 14, 15]
        );
    }

    #[test]
    fn fallback_may_still_converge() {
        // two attempts at 55 and 45 miss; the fallback at 15 gives 1500 < 1600
        let encoder = SizedByQuality::new(100);
        let config = SearchConfig {
            max_attempts: 2,
            emergency_quality: 15,
        };
        let outcome = encode_under_budget(&encoder, &image(), 1_600, 0.0, "png", &config).unwrap();
        assert_eq!(*encoder.calls.borrow(), vec![55, 45, 15]);
        assert_eq!(outcome.quality_used, 15);
        assert!(outcome.converged);
        assert!(outcome.fallback);
    }

    #[test]
    fn late_attempt_inside_budget_is_accepted() {
        let encoder = SizedByQuality::new(100);
        let outcome =
            encode_under_budget(&encoder, &image(), 1_600, 0.0, "png", &SearchConfig::default())
                .unwrap();
        // 16 → 1600 is not strictly smaller, 14 → 1400 is
        assert_eq!(outcome.quality_used, 14);
        assert_eq!(outcome.attempts, 8);
        assert!(outcome.converged);
        assert!(!outcome.fallback);
    }

    #[test]
    fn floor_stops_the_descent_before_budget() {
        let encoder = SizedByQuality::new(1_000);
        let config = SearchConfig {
            max_attempts: 50,
            emergency_quality: 15,
        };
        let outcome = encode_under_budget(&encoder, &image(), 1, 1.0, "png", &config).unwrap();
        let calls = encoder.calls.borrow();
        assert_eq!(
            *calls,
            vec![85, 75, 65, 55, 45, 35, 25, 20, 18, 16, 14, 12, 10, 15]
        );
        assert_eq!(outcome.attempts, 13);
        assert!(outcome.fallback);
        assert!(!outcome.converged);
    }

    #[test]
    fn single_attempt_budget() {
        let encoder = SizedByQuality::new(10);
        let config = SearchConfig {
            max_attempts: 1,
            emergency_quality: 15,
        };
        let outcome = encode_under_budget(&encoder, &image(), 100, 1.0, "png", &config).unwrap();
        assert_eq!(*encoder.calls.borrow(), vec![85, 15]);
        assert_eq!(outcome.final_size, 150);
        assert!(!outcome.converged);
    }

    #[test]
    fn encoder_errors_propagate() {
        let err = encode_under_budget(&Failing, &image(), 100, 1.0, "png", &SearchConfig::default())
            .unwrap_err();
        assert_eq!(err.category(), "encode");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SearchConfig {
            max_attempts: 0,
            emergency_quality: 15,
        };
        assert!(config.validate().is_err());
        let config = SearchConfig {
            max_attempts: 8,
            emergency_quality: 0,
        };
        assert!(config.validate().is_err());
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn real_jpeg_encoder_is_used_through_trait_object() {
        let encoder: &dyn QualityEncoder = &JpegQualityEncoder;
        let outcome =
            encode_under_budget(encoder, &image(), u64::MAX, 1.0, "png", &SearchConfig::default())
                .unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(&outcome.buffer[..2], &[0xFF, 0xD8]);
    }
}
