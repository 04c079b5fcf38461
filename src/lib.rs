//! # SVD Image Compression Library
//!
//! Lossy image compression by rank-`k` truncation of the singular value decomposition
//! of each color channel, followed by an adaptive JPEG re-encode that tries to keep the
//! output smaller than the original file.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//! - `codec`: decoding arbitrary inputs to RGB8, JPEG encoding
//! - `processing`: the size-constrained encoder search
//! - `report`: the result record and derived metrics
//! - `cache`: caller-side result cache keyed by content hash and `k`
//! - `config`: configuration and validation for batch runs
//! - `error`: error types and classification
//!
//! The numerical part (rank planning, per-channel SVD truncation) lives in the
//! `svd-rank` crate.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──decode──▶ RGB8 ──SVD rank-k per channel──▶ RGB8 ──JPEG quality search──▶ bytes + metrics
//! ```
//!
//! Every call is a pure function of `(image bytes, k)`: no shared state, no I/O beyond
//! what the caller passes in, safe to run concurrently on separate inputs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use svd_image_compress::compress;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("photo.png")?;
//! let result = compress(&bytes, "png", 50)?;
//!
//! println!(
//!     "{} → {} bytes ({}) in {:.3}s",
//!     result.before_size,
//!     result.after_size,
//!     result.ratio_label(),
//!     result.runtime_seconds()
//! );
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Instant;

use svd_rank::{RankPlan, decompose_and_reconstruct};
use tracing::{debug, info};

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod processing;
pub mod report;

/// Re-export error types for convenience
pub use error::{CompressError, CompressResult, HasRecoverySuggestion, HasSeverity};

/// Re-export commonly used types
pub use processing::{JpegQualityEncoder, QualityEncoder, SearchConfig, SearchOutcome};
pub use report::{CompressionReport, CompressionResult, OutputFormat};
pub use svd_rank::{Dims, RankTarget};

/// Compress an image with rank-`k` SVD truncation and a size-constrained JPEG search.
///
/// # Parameters
///
/// * `image_bytes` - Encoded input image (PNG, JPEG, or anything the decoder accepts)
/// * `original_extension` - Extension of the original file, used for logging only;
///   output is always JPEG
/// * `k` - Singular values to keep per channel; clamped to `[1, min(height, width)]`
///
/// # Errors
///
/// `InvalidInput` when the bytes cannot be decoded or the image is empty. Not reaching
/// a smaller size is not an error; see [`CompressionResult::size_reduced`].
pub fn compress(
    image_bytes: &[u8],
    original_extension: &str,
    k: i64,
) -> CompressResult<CompressionResult> {
    compress_with(
        &JpegQualityEncoder,
        image_bytes,
        original_extension,
        k,
        &SearchConfig::default(),
    )
}

/// [`compress`] with an explicit encoder and search limits.
pub fn compress_with<E: QualityEncoder + ?Sized>(
    encoder: &E,
    image_bytes: &[u8],
    original_extension: &str,
    k: i64,
    search: &SearchConfig,
) -> CompressResult<CompressionResult> {
    let start = Instant::now();
    let before_size = image_bytes.len() as u64;

    let decoded = codec::decode_rgb(image_bytes)?;
    let dims = decoded.dims();
    let (height, width) = (decoded.height(), decoded.width());

    let plan = RankPlan::new(dims, k);
    debug!(
        before_size,
        requested_k = plan.requested,
        k = plan.k,
        max_rank = dims.max_rank(),
        "rank plan"
    );

    let samples = decompose_and_reconstruct(decoded.pixels.as_raw(), dims, plan.k as i64)
        .map_err(|e| {
            CompressError::decomposition(e.to_string()).with_operation("decompose_and_reconstruct")
        })?;
    let reconstruction = codec::rgb_from_samples(width, height, samples)?;

    let outcome = processing::encode_under_budget(
        encoder,
        &reconstruction,
        before_size,
        plan.info_preserved(),
        original_extension,
        search,
    )?;

    let result = CompressionResult {
        after_size: outcome.final_size,
        output_bytes: outcome.buffer,
        output_format: OutputFormat::Jpeg,
        runtime: start.elapsed(),
        before_size,
        height,
        width,
        k: plan.k,
        quality: outcome.quality_used,
    };

    info!(
        k = result.k,
        quality = result.quality,
        before_size = result.before_size,
        after_size = result.after_size,
        runtime_s = result.runtime_seconds(),
        "compressed {}×{} image",
        height,
        width
    );

    Ok(result)
}

/// Read `path` and [`compress`] it, using the file's extension as the hint.
pub fn compress_file(path: impl AsRef<Path>, k: i64) -> CompressResult<CompressionResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CompressError::io_at("read input", path.display().to_string(), e))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    compress(&bytes, &extension, k)
}
