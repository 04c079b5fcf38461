//! # Result Cache
//!
//! Caller-side cache for compression results. `compress` is idempotent for identical
//! `(image bytes, k)`, so a result can be reused whenever both match.
//!
//! Keys hash the input content with BLAKE3; nothing is persisted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CompressResult;
use crate::report::CompressionResult;

/// Cache key: content hash of the input plus the requested rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Hex BLAKE3 digest of the input bytes
    pub content_hash: String,
    /// Rank as requested by the caller (before clamping)
    pub k: i64,
}

impl CacheKey {
    pub fn new(image_bytes: &[u8], k: i64) -> Self {
        Self {
            content_hash: content_hash(image_bytes),
            k,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.content_hash, self.k)
    }
}

/// Hex BLAKE3 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// In-memory map from [`CacheKey`] to shared results, with hit/miss counters.
#[derive(Debug, Default)]
pub struct CompressionCache {
    entries: HashMap<CacheKey, Arc<CompressionResult>>,
    hits: u64,
    misses: u64,
}

impl CompressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a result, counting the hit or miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<CompressionResult>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(Arc::clone(entry))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, result: CompressionResult) -> Arc<CompressionResult> {
        let entry = Arc::new(result);
        self.entries.insert(key, Arc::clone(&entry));
        entry
    }

    /// Return the cached result for `key`, or run `compress` and cache its result.
    ///
    /// Errors are not cached.
    pub fn get_or_compress<F>(
        &mut self,
        key: CacheKey,
        compress: F,
    ) -> CompressResult<(Arc<CompressionResult>, bool)>
    where
        F: FnOnce() -> CompressResult<CompressionResult>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok((hit, true));
        }
        let result = compress()?;
        Ok((self.insert(key, result), false))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
