//! # Compression Results and Reporting
//!
//! The immutable record returned by [`compress`](crate::compress) and the metrics
//! derived from it: size reduction, human-readable labels, and a serializable report.

use std::time::Duration;

use serde::Serialize;

use crate::error::CompressResult;

/// Output container format. The encoder search only targets JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
}

impl OutputFormat {
    /// File extension for the format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Outcome of one compression call.
///
/// `after_size` may be greater than or equal to `before_size` when the encoder search
/// could not reduce the file; check [`size_reduced`](Self::size_reduced).
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// Serialized compressed image
    pub output_bytes: Vec<u8>,
    pub output_format: OutputFormat,
    /// Wall-clock time spent in the call
    pub runtime: Duration,
    /// Original file size in bytes
    pub before_size: u64,
    /// Compressed size in bytes (`output_bytes.len()`)
    pub after_size: u64,
    pub height: u32,
    pub width: u32,
    /// Effective rank after clamping
    pub k: usize,
    /// JPEG quality of the accepted encode
    pub quality: u8,
}

impl CompressionResult {
    pub fn runtime_seconds(&self) -> f64 {
        self.runtime.as_secs_f64()
    }

    /// True when the output is strictly smaller than the original.
    pub fn size_reduced(&self) -> bool {
        self.after_size < self.before_size
    }

    /// `(before - after) / before * 100`; negative when the output grew.
    pub fn size_reduction_percent(&self) -> f64 {
        if self.before_size == 0 {
            return 0.0;
        }
        (self.before_size as f64 - self.after_size as f64) / self.before_size as f64 * 100.0
    }

    /// `"12.34%"` when smaller, `"+5.00% (larger)"` when the output grew.
    pub fn ratio_label(&self) -> String {
        let ratio = self.size_reduction_percent();
        if ratio >= 0.0 {
            format!("{:.2}%", ratio)
        } else {
            format!("+{:.2}% (larger)", ratio.abs())
        }
    }

    pub fn before_kb(&self) -> f64 {
        self.before_size as f64 / 1024.0
    }

    pub fn after_kb(&self) -> f64 {
        self.after_size as f64 / 1024.0
    }

    /// `"H×W"`
    pub fn dimension_label(&self) -> String {
        format!("{}×{}", self.height, self.width)
    }

    /// Flatten into a serializable report.
    pub fn to_report(&self) -> CompressionReport {
        CompressionReport {
            k: self.k,
            quality: self.quality,
            format: self.output_format,
            runtime: format!("{:.3}", self.runtime_seconds()),
            before_kb: format!("{:.2}", self.before_kb()),
            after_kb: format!("{:.2}", self.after_kb()),
            ratio: format!("{:.2}", self.size_reduction_percent()),
            dimension: self.dimension_label(),
            size_reduced: self.size_reduced(),
        }
    }
}

/// Per-image report with display-formatted values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub k: usize,
    pub quality: u8,
    pub format: OutputFormat,
    pub runtime: String,
    pub before_kb: String,
    pub after_kb: String,
    pub ratio: String,
    pub dimension: String,
    pub size_reduced: bool,
}

impl CompressionReport {
    pub fn to_json(&self) -> CompressResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
