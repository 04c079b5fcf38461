// SPDX-License-Identifier: MIT
//! # Rank Planning
//!
//! Computes the effective truncation rank for an image and the derived ratios the
//! encoder search keys on.
//!
//! ## Clamping
//!
//! A requested rank is always corrected into `[1, min(height, width)]`:
//! - `k <= 0` becomes `1`
//! - `k > min(height, width)` becomes `min(height, width)`
//!
//! Out-of-range ranks are documented input, not failures, so nothing in this module
//! returns an error.
//!
//! ## Compression Rate Targets
//!
//! Callers may ask for a "compression rate" in percent instead of a raw `k`.
//! [`RankTarget::CompressionRate`] maps it as `k = max(5, round(200 * (100 - rate) / 100))`.

/// Largest `k` a compression rate maps to (rate = 0%).
pub const RATE_MAX_K: u32 = 200;

/// Smallest `k` a compression rate maps to.
pub const RATE_MIN_K: u32 = 5;

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub height: usize,
    pub width: usize,
}

impl Dims {
    /// Maximum meaningful rank, `min(height, width)`.
    pub fn max_rank(self) -> usize {
        self.height.min(self.width)
    }

    /// Number of pixels.
    pub fn pixel_count(self) -> usize {
        self.height * self.width
    }

    /// Number of interleaved RGB samples (`pixels * 3`).
    pub fn sample_count(self) -> usize {
        self.pixel_count() * 3
    }

    /// True when either side is zero.
    pub fn is_empty(self) -> bool {
        self.height == 0 || self.width == 0
    }
}

/// Clamp a requested rank into `[1, min(height, width)]`.
///
/// For an empty image the result is `1`; callers reject empty images before
/// decomposition anyway.
///
/// # Examples
///
/// ```rust
/// use svd_rank::rank::{clamp_rank, Dims};
///
/// let dims = Dims { height: 100, width: 50 };
/// assert_eq!(clamp_rank(0, dims), 1);
/// assert_eq!(clamp_rank(-3, dims), 1);
/// assert_eq!(clamp_rank(20, dims), 20);
/// assert_eq!(clamp_rank(10_000_000, dims), 50);
/// ```
pub fn clamp_rank(requested: i64, dims: Dims) -> usize {
    let max_rank = dims.max_rank().max(1);
    if requested <= 0 {
        return 1;
    }
    usize::try_from(requested).map_or(max_rank, |k| k.min(max_rank))
}

/// Convert a compression rate in percent into a requested rank.
///
/// Higher rates keep fewer singular values. Rates above 100 are treated as 100.
pub fn k_from_compression_rate(rate: u8) -> i64 {
    let rate = u32::from(rate.min(100));
    let k = (f64::from(RATE_MAX_K) * f64::from(100 - rate) / 100.0).round() as u32;
    i64::from(k.max(RATE_MIN_K))
}

/// How the caller expressed the desired rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankTarget {
    /// Keep exactly this many singular values (after clamping).
    Exact(i64),
    /// Derive `k` from a compression rate in percent.
    CompressionRate(u8),
}

impl RankTarget {
    /// Requested rank before clamping.
    pub fn requested(self) -> i64 {
        match self {
            RankTarget::Exact(k) => k,
            RankTarget::CompressionRate(rate) => k_from_compression_rate(rate),
        }
    }
}

/// Resolved rank for one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankPlan {
    /// Image dimensions the plan was built for
    pub dims: Dims,
    /// Rank as requested by the caller
    pub requested: i64,
    /// Effective rank in `[1, max_rank]`
    pub k: usize,
}

impl RankPlan {
    /// Build a plan, clamping `requested` into range.
    pub fn new(dims: Dims, requested: i64) -> Self {
        Self {
            dims,
            requested,
            k: clamp_rank(requested, dims),
        }
    }

    /// Fraction of the full rank that survives truncation, `k / min(height, width)`.
    pub fn info_preserved(&self) -> f64 {
        self.k as f64 / self.dims.max_rank().max(1) as f64
    }

    /// True when no singular values are discarded.
    pub fn is_full_rank(&self) -> bool {
        self.k >= self.dims.max_rank()
    }

    /// True when the requested rank had to be corrected.
    pub fn was_clamped(&self) -> bool {
        i64::try_from(self.k).map_or(true, |k| k != self.requested)
    }
}
