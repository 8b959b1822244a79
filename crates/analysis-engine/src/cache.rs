use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::results::AnalysisResults;

/// Cached `AnalysisResults` plus the timestamp it was computed at, mirroring
/// the teacher orchestrator's `CacheEntry<T>` convention.
pub struct CacheEntry {
    pub data: Arc<AnalysisResults>,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: Arc<AnalysisResults>) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.cached_at).num_seconds()
    }

    pub fn is_fresh(&self, ttl_s: i64) -> bool {
        self.age_seconds() < ttl_s
    }
}
