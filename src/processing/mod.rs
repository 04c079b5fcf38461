//! # Processing Module
//!
//! The size-constrained encoder search: initial quality selection and the bounded
//! quality descent that re-encodes the rank-`k` reconstruction below the original size.

pub mod quality;
pub mod search;

// Re-export commonly used types for convenience
pub use quality::{InfoBucket, SizeBucket, initial_quality, next_quality};
pub use search::{
    JpegQualityEncoder, QualityEncoder, SearchConfig, SearchOutcome, encode_under_budget,
};
