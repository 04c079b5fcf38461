// SPDX-License-Identifier: MIT
//! # Rank-Truncated Decomposition
//!
//! Per-channel economy SVD of an interleaved RGB8 image, hard truncation to the top
//! `k` singular triplets, and reconstruction back to 8-bit samples.
//!
//! ## Algorithm
//!
//! For each channel independently (R, G, B):
//! 1. Build the `height × width` matrix of sample intensities as `f64`
//! 2. Factorize `A = U · diag(S) · Vt` (economy size, `r = min(height, width)`),
//!    checked against `A` and recomputed from the Gram matrix if the check fails
//! 3. Keep `S[0..k]`, drop the rest (hard truncation, not a soft threshold)
//! 4. Rebuild `U_k · diag(S_k) · Vt_k`
//! 5. Clip to `[0, 255]`, round, write back into the interleaved buffer
//!
//! Factors are transient: they live for one channel and are dropped.

use anyhow::{ensure, Result};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::rank::{clamp_rank, Dims};

/// Number of interleaved channels in the pixel buffers handled here.
pub const CHANNELS: usize = 3;

/// Relative recomposition residual above which SVD factors are rejected.
const RECOMPOSE_TOLERANCE: f64 = 1e-9;

/// Per-dimension drift from orthonormality above which SVD factors are rejected.
const ORTHONORMAL_TOLERANCE: f64 = 1e-9;

/// Economy SVD factors of one channel, singular values sorted descending.
#[derive(Clone, Debug)]
pub struct ChannelFactors {
    /// Left singular vectors, `rows × r`
    pub u: DMatrix<f64>,
    /// Singular values, length `r`, descending and non-negative
    pub singular_values: DVector<f64>,
    /// Right singular vectors (transposed), `r × cols`
    pub v_t: DMatrix<f64>,
}

impl ChannelFactors {
    /// Factorize a channel matrix.
    ///
    /// The bidiagonal SVD is tried first and kept only if its factors rebuild the
    /// matrix and are orthonormal. Rank-deficient non-square inputs (a constant
    /// channel, for one) can fail that check; those are factorized through the
    /// eigen-decomposition of the smaller Gram matrix instead.
    pub fn factorize(matrix: DMatrix<f64>) -> Result<Self> {
        ensure!(
            matrix.nrows() > 0 && matrix.ncols() > 0,
            "cannot factorize an empty {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        );

        let svd = matrix.clone().svd(true, true);
        if let (Some(u), Some(v_t)) = (svd.u, svd.v_t) {
            let factors = sort_descending(u, svd.singular_values, v_t);
            if factors.is_faithful(&matrix) {
                return Ok(factors);
            }
        }

        Self::from_gram(&matrix)
    }

    /// Factors from the symmetric eigen-decomposition of `AᵀA` (or `AAᵀ` when wide).
    ///
    /// Singular values are measured as `‖A·v‖` rather than `sqrt(λ)`, so
    /// `U·diag(S)·Vt` rebuilds `A` even where eigenvalues collapse to zero.
    /// Left vectors paired with a zero singular value are zero.
    fn from_gram(matrix: &DMatrix<f64>) -> Result<Self> {
        if matrix.nrows() < matrix.ncols() {
            // A = (Aᵀ)ᵀ = V·S·Uᵀ
            let transposed = Self::from_gram(&matrix.transpose())?;
            return Ok(Self {
                u: transposed.v_t.transpose(),
                singular_values: transposed.singular_values,
                v_t: transposed.u.transpose(),
            });
        }

        let eigen = SymmetricEigen::new(matrix.transpose() * matrix);
        let v = eigen.eigenvectors;
        let mut u = matrix * &v;
        let mut singular_values = DVector::zeros(v.ncols());
        for (j, mut column) in u.column_iter_mut().enumerate() {
            let norm = column.norm();
            if norm > f64::MIN_POSITIVE {
                column /= norm;
                singular_values[j] = norm;
            } else {
                column.fill(0.0);
            }
        }
        ensure!(
            singular_values.iter().all(|s| s.is_finite()),
            "gram factorization produced non-finite singular values"
        );

        Ok(sort_descending(u, singular_values, v.transpose()))
    }

    /// True when the factors rebuild `matrix` and `U`, `Vt` are orthonormal.
    fn is_faithful(&self, matrix: &DMatrix<f64>) -> bool {
        let r = self.rank();
        let scale = matrix.norm().max(1.0);
        let identity = DMatrix::<f64>::identity(r, r);

        let residual = frobenius_error(matrix, &self.reconstruct(r));
        let u_drift = (self.u.transpose() * &self.u - &identity).norm();
        let v_drift = (&self.v_t * self.v_t.transpose() - &identity).norm();

        let drift_limit = ORTHONORMAL_TOLERANCE * r as f64;
        residual <= RECOMPOSE_TOLERANCE * scale && u_drift <= drift_limit && v_drift <= drift_limit
    }

    /// Number of singular triplets, `min(rows, cols)`.
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Rebuild the channel from the top `k` singular triplets.
    ///
    /// `k` larger than [`rank`](Self::rank) keeps every triplet.
    pub fn reconstruct(&self, k: usize) -> DMatrix<f64> {
        let k = k.min(self.rank());
        if k == 0 {
            return DMatrix::zeros(self.u.nrows(), self.v_t.ncols());
        }

        // U_k · diag(S_k) without materializing the diagonal
        let mut left = self.u.columns(0, k).clone_owned();
        for (j, mut column) in left.column_iter_mut().enumerate() {
            column *= self.singular_values[j];
        }
        &left * &self.v_t.rows(0, k)
    }
}

/// Reorder triplets so singular values are descending.
fn sort_descending(
    u: DMatrix<f64>,
    singular_values: DVector<f64>,
    v_t: DMatrix<f64>,
) -> ChannelFactors {
    let mut order: Vec<usize> = (0..singular_values.len()).collect();
    order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]));

    if order.iter().enumerate().all(|(idx, orig)| idx == *orig) {
        return ChannelFactors {
            u,
            singular_values,
            v_t,
        };
    }

    ChannelFactors {
        u: u.select_columns(order.iter()),
        singular_values: DVector::from_iterator(
            order.len(),
            order.iter().map(|&i| singular_values[i]),
        ),
        v_t: v_t.select_rows(order.iter()),
    }
}

/// Extract one channel of an interleaved RGB8 buffer as a `height × width` matrix.
pub fn channel_matrix(pixels: &[u8], dims: Dims, channel: usize) -> DMatrix<f64> {
    let width = dims.width;
    DMatrix::from_fn(dims.height, width, |row, col| {
        f64::from(pixels[(row * width + col) * CHANNELS + channel])
    })
}

/// Best rank-`k` approximation of a single channel matrix, in floating point.
pub fn truncate_channel(matrix: DMatrix<f64>, k: usize) -> Result<DMatrix<f64>> {
    Ok(ChannelFactors::factorize(matrix)?.reconstruct(k))
}

/// Frobenius norm of `a - b`.
pub fn frobenius_error(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    (a - b).norm()
}

/// Clip a reconstructed sample to `[0, 255]` and round to `u8`.
#[inline]
fn to_sample(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

/// Replace each channel of an interleaved RGB8 image with its rank-`k` approximation.
///
/// `k` is clamped into `[1, min(height, width)]` first, so `0` behaves like `1` and
/// anything above the full rank behaves like the full rank.
///
/// # Arguments
/// * `pixels` - Interleaved RGB8 samples, `height * width * 3` bytes, row-major
/// * `dims` - Image dimensions
/// * `k` - Requested rank
///
/// # Errors
/// Returns an error when the image is empty or the buffer length does not match
/// `dims`. Valid input never fails.
pub fn decompose_and_reconstruct(pixels: &[u8], dims: Dims, k: i64) -> Result<Vec<u8>> {
    ensure!(
        !dims.is_empty(),
        "image must be at least 1x1, got {}x{}",
        dims.height,
        dims.width
    );
    ensure!(
        pixels.len() == dims.sample_count(),
        "pixel buffer has {} bytes, expected {} for {}x{} RGB",
        pixels.len(),
        dims.sample_count(),
        dims.height,
        dims.width
    );

    let k = clamp_rank(k, dims);
    let mut out = vec![0u8; pixels.len()];

    for channel in 0..CHANNELS {
        let approx = truncate_channel(channel_matrix(pixels, dims, channel), k)?;
        for row in 0..dims.height {
            for col in 0..dims.width {
                out[(row * dims.width + col) * CHANNELS + channel] =
                    to_sample(approx[(row, col)]);
            }
        }
    }

    Ok(out)
}
