//! # Configuration Module
//!
//! Configuration for batch compression runs. It is the common interface between the
//! `svdc` CLI and the library entry points.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `inputs` | `Vec<PathBuf>` | ≥ 1 file, `.png`/`.jpg`/`.jpeg` | Images to compress |
//! | `out_dir` | `PathBuf` | Any directory | Where compressed JPEGs are written |
//! | `rank` | `RankTarget` | any `k`, or rate 0–100 | Singular values to keep |
//! | `json` | `bool` | true/false | Print JSON reports instead of text |
//! | `search` | `SearchConfig` | attempts ≥ 1, quality 1–100 | Encoder search limits |
//!
//! ## Rank Targets
//!
//! - `RankTarget::Exact(k)`: any integer; clamped to `[1, min(height, width)]` per image
//! - `RankTarget::CompressionRate(rate)`: percent; `k = max(5, round(200 * (100 - rate) / 100))`
//!
//! ## Examples
//!
//! ```rust
//! use svd_image_compress::config::CompressConfig;
//! use svd_rank::RankTarget;
//!
//! let mut config = CompressConfig::default();
//! config.inputs.push("photo.png".into());
//! config.rank = RankTarget::CompressionRate(75);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.requested_k(), 50);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use svd_rank::RankTarget;

use crate::codec::is_supported_extension;
use crate::error::{CompressError, CompressResult};
use crate::processing::SearchConfig;
use crate::report::OutputFormat;

/// Rank used when the caller does not choose one.
pub const DEFAULT_K: i64 = 100;

/// Configuration for a compression run.
#[derive(Debug, Clone)]
pub struct CompressConfig {
    /// Input image paths.
    pub inputs: Vec<PathBuf>,

    /// Directory the compressed files are written to. Must exist.
    pub out_dir: PathBuf,

    /// How many singular values to keep.
    pub rank: RankTarget,

    /// Emit one JSON report per image instead of summary lines.
    pub json: bool,

    /// Encoder search limits.
    pub search: SearchConfig,
}

impl Default for CompressConfig {
    /// Default values:
    /// - `inputs`: empty
    /// - `out_dir`: current directory
    /// - `rank`: `Exact(100)`
    /// - `json`: false
    /// - `search`: 8 attempts, emergency quality 15
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: PathBuf::from("."),
            rank: RankTarget::Exact(DEFAULT_K),
            json: false,
            search: SearchConfig::default(),
        }
    }
}

impl CompressConfig {
    /// Creates a configuration with default search limits.
    pub fn new(inputs: Vec<PathBuf>, out_dir: PathBuf, rank: RankTarget, json: bool) -> Self {
        Self {
            inputs,
            out_dir,
            rank,
            json,
            search: SearchConfig::default(),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `Config` for the first unusable input or rate, `Validation` for bad search limits.
    pub fn validate(&self) -> CompressResult<()> {
        if self.inputs.is_empty() {
            return Err(CompressError::config(
                "inputs",
                "[]",
                "at least one input image is required",
            ));
        }

        for input in &self.inputs {
            let supported = input
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(is_supported_extension);
            if !supported {
                return Err(CompressError::config(
                    "inputs",
                    input.display().to_string(),
                    "only PNG, JPG and JPEG files are allowed",
                )
                .with_recovery_suggestion("Convert the image to PNG or JPEG first"));
            }
        }

        if let RankTarget::CompressionRate(rate) = self.rank {
            if rate > 100 {
                return Err(CompressError::config(
                    "rate",
                    rate.to_string(),
                    "must be between 0 and 100",
                ));
            }
        }

        self.search.validate()
    }

    /// Rank requested from the library, before per-image clamping.
    pub fn requested_k(&self) -> i64 {
        self.rank.requested()
    }

    /// Output path for `input`: `<out_dir>/svd_<stem>_k<k>.jpg`.
    pub fn output_path(&self, input: &Path, k: usize) -> PathBuf {
        self.numbered_output_path(input, k, 1)
    }

    /// `n > 1` appends `_<n>` to the stem part of [`output_path`](Self::output_path).
    fn numbered_output_path(&self, input: &Path, k: usize, n: usize) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let suffix = if n > 1 { format!("_{}", n) } else { String::new() };
        self.out_dir.join(format!(
            "svd_{}_k{}{}.{}",
            stem,
            k,
            suffix,
            OutputFormat::Jpeg.extension()
        ))
    }
}

/// Hands out output paths for one run so that distinct inputs never share one.
///
/// `photos/cat.png`, `scans/cat.png` and `cat.jpg` all map to `svd_cat_k<k>.jpg`;
/// the second and later claimants get `svd_cat_k<k>_2.jpg`, `_3` and so on. The
/// same input listed twice keeps its first path.
#[derive(Debug, Default)]
pub struct OutputPlanner {
    claimed: HashMap<PathBuf, PathBuf>,
}

/// Output path chosen for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    pub path: PathBuf,
    /// True when the plain name was already taken by another input
    pub renamed: bool,
}

impl OutputPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an output path for `input` compressed at rank `k`.
    pub fn claim(&mut self, config: &CompressConfig, input: &Path, k: usize) -> PlannedOutput {
        let mut n = 1;
        loop {
            let path = config.numbered_output_path(input, k, n);
            match self.claimed.get(&path) {
                Some(owner) if owner.as_path() != input => n += 1,
                Some(_) => return PlannedOutput { path, renamed: n > 1 },
                None => {
                    self.claimed.insert(path.clone(), input.to_path_buf());
                    return PlannedOutput { path, renamed: n > 1 };
                }
            }
        }
    }
}
