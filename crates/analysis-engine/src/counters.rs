use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Run-level observability counters (§4.6.5), accumulated across the
/// engine's lifetime rather than reset per call.
#[derive(Debug, Default)]
pub struct PerformanceCounters {
    total_calculations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    error_count: AtomicU64,
    total_calc_time_micros: AtomicU64,
}

/// Serializable snapshot of [`PerformanceCounters`], embedded in
/// `AnalysisResults.metadata`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_calculations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub error_count: u64,
    pub avg_calculation_time_s: f64,
}

impl PerformanceCounters {
    pub fn record_calculation(&self, elapsed_micros: u64) {
        self.total_calculations.fetch_add(1, Ordering::Relaxed);
        self.total_calc_time_micros.fetch_add(elapsed_micros, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed) as f64;
        let misses = self.cache_misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }

    pub fn snapshot(&self) -> PerformanceMetrics {
        let total = self.total_calculations.load(Ordering::Relaxed);
        let total_time = self.total_calc_time_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        PerformanceMetrics {
            total_calculations: total,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_calculation_time_s: if total == 0 { 0.0 } else { total_time / total as f64 },
        }
    }
}
