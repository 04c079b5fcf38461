// SPDX-License-Identifier: MIT
//! # svd-rank: Rank-Truncated SVD Reconstruction for RGB Images
//!
//! This crate provides the numerical core of the SVD image compressor: it plans the
//! rank `k` to keep for an image and rebuilds each color channel from its top `k`
//! singular triplets.
//!
//! ## Architecture Overview
//!
//! The crate is split into two small layers:
//! 1. **Rank planning** ([`rank`]): clamp a requested rank into `[1, min(h, w)]`,
//!    derive the information-preserved ratio, map UI compression rates to `k`
//! 2. **Decomposition** ([`decompose`]): economy-size SVD per channel, hard truncation,
//!    reconstruction, clip/round back to 8-bit
//!
//! Everything here is pure compute. No I/O, no global state, no logging.
//!
//! ## Numeric Guarantees
//!
//! - The rank-`k` reconstruction of each channel is the Frobenius-optimal rank-`k`
//!   approximation (Eckart–Young), before the final clip/round to `u8`
//! - Identical `(pixels, k)` inputs always produce bit-identical outputs
//! - Out-of-range `k` is silently clamped, never an error
//!
//! ## Usage Example
//!
//! ```rust
//! use svd_rank::{decompose::decompose_and_reconstruct, rank::{Dims, RankPlan}};
//!
//! // 4x3 interleaved RGB8 image
//! let dims = Dims { height: 4, width: 3 };
//! let pixels: Vec<u8> = (0..dims.sample_count()).map(|i| (i * 7 % 256) as u8).collect();
//!
//! let plan = RankPlan::new(dims, 2);
//! assert_eq!(plan.k, 2);
//!
//! let approx = decompose_and_reconstruct(&pixels, dims, 2)?;
//! assert_eq!(approx.len(), pixels.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod decompose;
pub mod rank;

pub use decompose::{decompose_and_reconstruct, ChannelFactors};
pub use rank::{clamp_rank, Dims, RankPlan, RankTarget};
