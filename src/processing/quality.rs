//! # Quality Selection
//!
//! Pure mappings that drive the encoder search:
//!
//! | Original size \ info preserved | `>= 0.7` | `>= 0.4` | `>= 0.2` | `< 0.2` |
//! |--------------------------------|----------|----------|----------|---------|
//! | large (`> 500 KB`)             | 75       | 65       | 55       | 45      |
//! | medium (`100–500 KB`)          | 80       | 70       | 60       | 50      |
//! | small (`<= 100 KB`)            | 85       | 75       | 65       | 55      |
//!
//! The descent schedule steps by 10 above 30, by 5 above 20, by 2 above 10, and
//! stops at the floor.

/// Originals strictly larger than this are "large".
pub const LARGE_FILE_BYTES: u64 = 500_000;

/// Originals strictly larger than this (and not large) are "medium".
pub const MEDIUM_FILE_BYTES: u64 = 100_000;

/// Quality at which the descent stops.
pub const FLOOR_QUALITY: u8 = 10;

/// Original file size bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeBucket {
    Large,
    Medium,
    Small,
}

impl SizeBucket {
    pub fn classify(original_size: u64) -> Self {
        if original_size > LARGE_FILE_BYTES {
            SizeBucket::Large
        } else if original_size > MEDIUM_FILE_BYTES {
            SizeBucket::Medium
        } else {
            SizeBucket::Small
        }
    }

    fn row(self) -> usize {
        match self {
            SizeBucket::Large => 0,
            SizeBucket::Medium => 1,
            SizeBucket::Small => 2,
        }
    }
}

/// Information-preserved ratio bucket (`k / min(height, width)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoBucket {
    /// `>= 0.7`
    High,
    /// `>= 0.4`
    Moderate,
    /// `>= 0.2`
    Low,
    /// `< 0.2`
    Minimal,
}

impl InfoBucket {
    pub fn classify(info_preserved: f64) -> Self {
        if info_preserved >= 0.7 {
            InfoBucket::High
        } else if info_preserved >= 0.4 {
            InfoBucket::Moderate
        } else if info_preserved >= 0.2 {
            InfoBucket::Low
        } else {
            InfoBucket::Minimal
        }
    }

    fn column(self) -> usize {
        match self {
            InfoBucket::High => 0,
            InfoBucket::Moderate => 1,
            InfoBucket::Low => 2,
            InfoBucket::Minimal => 3,
        }
    }
}

const INITIAL_QUALITY: [[u8; 4]; 3] = [
    [75, 65, 55, 45], // large
    [80, 70, 60, 50], // medium
    [85, 75, 65, 55], // small
];

/// Starting JPEG quality for the encoder search.
pub fn initial_quality(original_size: u64, info_preserved: f64) -> u8 {
    let row = SizeBucket::classify(original_size).row();
    let column = InfoBucket::classify(info_preserved).column();
    INITIAL_QUALITY[row][column]
}

/// Next quality to try after an attempt that was not small enough.
///
/// Returns `None` once the floor is reached; the search stops there.
pub fn next_quality(quality: u8) -> Option<u8> {
    match quality {
        q if q > 30 => Some(q - 10),
        q if q > 20 => Some(q - 5),
        q if q > FLOOR_QUALITY => Some(q - 2),
        _ => None,
    }
}
