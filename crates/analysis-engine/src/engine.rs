use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rating_core::{AnalysisError, Dataset, RatingSeries};

use crate::cache::CacheEntry;
use crate::config::EngineConfig;
use crate::counters::PerformanceCounters;
use crate::market::MarketResult;
use crate::ranking::{top_industries, top_stocks, RankedIndustry, RankedStock, StockMetric};
use crate::results::{AnalysisMetadata, AnalysisResults, IndustryEntry, IndustryMember, StockEntry};
use crate::trend::{detect_trend_changes, TrendSignal};

/// Result of a dataset hot-swap via [`AnalysisEngine::update`] (§4.6.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub total_stocks: usize,
    pub total_industries: usize,
    pub updated_at: DateTime<Utc>,
}

/// Orchestrates RTSI/IRSI/MSCI over a shared dataset, caching the combined
/// result per snapshot key. Mirrors the teacher orchestrator's shape: a
/// `DashMap` cache keyed by snapshot, a single `Mutex` guarding the
/// recompute critical section, and a cheap `RwLock`-backed "latest" slot so
/// read-path accessors (`top_stocks`, `detect_trend_changes`, ...) never
/// block behind a computation targeting a different key.
pub struct AnalysisEngine {
    config: EngineConfig,
    dataset: RwLock<Arc<Dataset>>,
    cache: DashMap<String, CacheEntry>,
    calc_lock: Mutex<()>,
    counters: PerformanceCounters,
    latest: RwLock<Option<(String, Arc<AnalysisResults>)>>,
    cancelled: AtomicBool,
}

/// Up to this many member stocks are attached to each `IndustryEntry`,
/// ranked by RTSI descending then code ascending (§4.6.1).
const MAX_INDUSTRY_MEMBERS: usize = 10;

impl AnalysisEngine {
    pub fn new(config: EngineConfig, dataset: Dataset) -> Self {
        Self {
            config,
            dataset: RwLock::new(Arc::new(dataset)),
            cache: DashMap::new(),
            calc_lock: Mutex::new(()),
            counters: PerformanceCounters::default(),
            latest: RwLock::new(None),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Marks the current (and any future) run as cancelled; checked between
    /// phases of `calculate_all_metrics` so an in-flight run can stop
    /// promptly without corrupting the cache.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Replaces the dataset wholesale and drops the cache, per §4.6.6: a
    /// later `calculate_all_metrics` call recomputes everything from
    /// scratch against the new data.
    pub fn update(&self, dataset: Dataset) -> UpdateStatus {
        let total_stocks = dataset.len();
        let total_industries = dataset.industries().len();
        *self.dataset.write().expect("dataset lock poisoned") = Arc::new(dataset);
        self.cache.clear();
        *self.latest.write().expect("latest lock poisoned") = None;
        info!(total_stocks, total_industries, "dataset updated, cache cleared");
        UpdateStatus {
            total_stocks,
            total_industries,
            updated_at: Utc::now(),
        }
    }

    pub fn performance_metrics(&self) -> crate::counters::PerformanceMetrics {
        self.counters.snapshot()
    }

    /// §4.6.3 read-path wrapper over the most recently completed result.
    pub fn top_stocks(&self, metric: StockMetric, n: usize) -> Vec<RankedStock> {
        match &*self.latest.read().expect("latest lock poisoned") {
            Some((_, results)) => top_stocks(results, metric, n),
            None => Vec::new(),
        }
    }

    pub fn top_industries(&self, n: usize) -> Vec<RankedIndustry> {
        match &*self.latest.read().expect("latest lock poisoned") {
            Some((_, results)) => top_industries(results, n),
            None => Vec::new(),
        }
    }

    pub fn detect_trend_changes(&self) -> Vec<TrendSignal> {
        match &*self.latest.read().expect("latest lock poisoned") {
            Some((_, results)) => detect_trend_changes(results),
            None => Vec::new(),
        }
    }

    /// Computes (or returns a cached copy of) the full stock/industry/market
    /// analysis for the current dataset under `snapshot_key`.
    ///
    /// Double-checked locking: a fresh cache hit returns immediately without
    /// taking `calc_lock`; otherwise the lock is acquired and the cache is
    /// re-checked before recomputing, so concurrent callers racing on the
    /// same key don't duplicate the work.
    pub fn calculate_all_metrics(
        &self,
        snapshot_key: &str,
        force_refresh: bool,
    ) -> Result<Arc<AnalysisResults>, AnalysisError> {
        if !force_refresh {
            if let Some(entry) = self.cache.get(snapshot_key) {
                if entry.is_fresh(self.config.cache_ttl_s) {
                    self.counters.record_cache_hit();
                    debug!(snapshot_key, "cache hit");
                    return Ok(entry.data.clone());
                }
            }
        }

        let _guard = self.calc_lock.lock().expect("calc lock poisoned");

        if !force_refresh {
            if let Some(entry) = self.cache.get(snapshot_key) {
                if entry.is_fresh(self.config.cache_ttl_s) {
                    self.counters.record_cache_hit();
                    return Ok(entry.data.clone());
                }
            }
        }
        self.counters.record_cache_miss();

        let started = Instant::now();
        let dataset = self.dataset.read().expect("dataset lock poisoned").clone();
        let deadline_s = self.config.timeout_s as u64;

        let results = self.compute(&dataset, started, deadline_s)?;
        let results = Arc::new(results);

        self.cache
            .insert(snapshot_key.to_string(), CacheEntry::new(results.clone()));
        *self.latest.write().expect("latest lock poisoned") =
            Some((snapshot_key.to_string(), results.clone()));

        let elapsed = started.elapsed();
        self.counters.record_calculation(elapsed.as_micros() as u64);
        info!(
            snapshot_key,
            elapsed_s = elapsed.as_secs_f64(),
            total_stocks = results.metadata.total_stocks,
            "analysis complete"
        );

        Ok(results)
    }

    fn check_deadline(&self, started: Instant, deadline_s: u64, phase: &str) -> Result<(), AnalysisError> {
        if self.cancelled.swap(false, Ordering::SeqCst) {
            return Err(AnalysisError::Cancelled(format!("cancelled before {phase}")));
        }
        if deadline_s > 0 && started.elapsed().as_secs() >= deadline_s {
            self.counters.record_error();
            return Err(AnalysisError::Timeout(format!(
                "exceeded {deadline_s}s budget before {phase}"
            )));
        }
        Ok(())
    }

    /// Runs the three index calculations in sequence, checking the wall-clock
    /// budget between phases rather than per task (§5): a slow stock doesn't
    /// get killed mid-calculation, but the run as a whole won't run away.
    fn compute(&self, dataset: &Dataset, started: Instant, deadline_s: u64) -> Result<AnalysisResults, AnalysisError> {
        // RTSI and IRSI both read C4's "full interpolated dataset" input
        // contract (spec.md:116) off this single shared view, built once so
        // an entity's forward-filled values agree between the two rather
        // than each calculator improvising its own fill.
        let interpolated: Vec<RatingSeries> = dataset.series.iter().map(|s| s.interpolate().0).collect();

        self.check_deadline(started, deadline_s, "rtsi")?;
        let stocks = self.compute_stocks(dataset, &interpolated);

        self.check_deadline(started, deadline_s, "irsi")?;
        let industries = self.compute_industries(dataset, &interpolated, &stocks);

        self.check_deadline(started, deadline_s, "msci")?;
        let market = self.compute_market(dataset);

        let metadata = AnalysisMetadata {
            total_stocks: stocks.len(),
            total_industries: industries.len(),
            calculation_time_s: started.elapsed().as_secs_f64(),
            cache_hit_rate: self.counters.cache_hit_rate(),
            performance_metrics: self.counters.snapshot(),
        };

        Ok(AnalysisResults {
            stocks,
            industries,
            market,
            metadata,
        })
    }

    /// Per-stock RTSI, fanned out over rayon when `config.parallel` and
    /// folded into a sorted map by code. A per-entity calculation failure is
    /// logged and the entity omitted rather than failing the whole run
    /// (§4.6.2/§7).
    fn compute_stocks(&self, dataset: &Dataset, interpolated: &[RatingSeries]) -> std::collections::HashMap<String, StockEntry> {
        let rtsi_config = self.config.rtsi.into();
        let build = |idx: usize| -> Option<(String, StockEntry)> {
            let entity = &dataset.entities[idx];
            let series = &interpolated[idx];
            match rtsi_calculator::calculate(series, &rtsi_config) {
                Ok(rtsi) => {
                    let last_score = series
                        .cells
                        .iter()
                        .rev()
                        .find_map(|c| c.map(|r| r.score_ordinal()))
                        .unwrap_or(0);
                    Some((
                        entity.code.clone(),
                        StockEntry {
                            name: entity.name.clone(),
                            industry: entity.industry.clone(),
                            trend: rtsi.trend,
                            last_score,
                            rtsi,
                        },
                    ))
                }
                Err(err) => {
                    warn!(code = %entity.code, error = %err, "rtsi calculation failed, omitting stock");
                    None
                }
            }
        };

        let indices: Vec<usize> = (0..dataset.len()).collect();
        let entries: Vec<(String, StockEntry)> = if self.config.parallel {
            self.worker_pool()
                .install(|| indices.into_par_iter().filter_map(build).collect())
        } else {
            indices.into_iter().filter_map(build).collect()
        };

        entries.into_iter().collect()
    }

    /// Builds a scoped pool sized to `config.max_workers` rather than
    /// dispatching onto rayon's ambient global pool, so the configured
    /// worker count (§6) actually bounds per-stock/per-industry fan-out.
    fn worker_pool(&self) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .build()
            .expect("failed to build worker pool")
    }

    /// Per-industry IRSI against the full market. Representative members
    /// (up to 10, highest RTSI first, ties by code) are drawn from the
    /// already-computed stock map rather than recalculated.
    fn compute_industries(
        &self,
        dataset: &Dataset,
        interpolated: &[RatingSeries],
        stocks: &std::collections::HashMap<String, StockEntry>,
    ) -> std::collections::HashMap<String, IndustryEntry> {
        let irsi_config = self.config.irsi.into();
        let industries = dataset.industries();

        let build = |label: &String| -> Option<(String, IndustryEntry)> {
            let industry_series: Vec<_> = dataset
                .entities
                .iter()
                .zip(interpolated.iter())
                .filter(|(e, _)| &e.industry == label)
                .map(|(_, s)| s.clone())
                .collect();

            match irsi_calculator::calculate(&industry_series, interpolated, &irsi_config) {
                Ok(irsi) => {
                    let mut members: Vec<IndustryMember> = dataset
                        .industry_rows(label)
                        .into_iter()
                        .filter_map(|(e, _)| {
                            stocks.get(&e.code).map(|s| IndustryMember {
                                code: e.code.clone(),
                                name: e.name.clone(),
                                rtsi: s.rtsi.score,
                            })
                        })
                        .collect();
                    members.sort_by(|a, b| {
                        b.rtsi
                            .partial_cmp(&a.rtsi)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then_with(|| a.code.cmp(&b.code))
                    });
                    members.truncate(MAX_INDUSTRY_MEMBERS);

                    Some((
                        label.clone(),
                        IndustryEntry {
                            stock_count: industry_series.len(),
                            status: irsi.strength,
                            stocks: members,
                            irsi,
                        },
                    ))
                }
                Err(err) => {
                    warn!(industry = %label, error = %err, "irsi calculation failed, omitting industry");
                    None
                }
            }
        };

        let entries: Vec<(String, IndustryEntry)> = if self.config.parallel {
            self.worker_pool()
                .install(|| industries.par_iter().filter_map(build).collect())
        } else {
            industries.iter().filter_map(build).collect()
        };

        entries.into_iter().collect()
    }

    /// MSCI over the raw (uninterpolated) dataset: its participation ratio
    /// and `total_rated` count are defined against genuinely missing cells,
    /// so this must not reuse the RTSI/IRSI interpolated view.
    fn compute_market(&self, dataset: &Dataset) -> MarketResult {
        let msci_config = self.config.msci.into();
        if self.config.msci.use_enhanced {
            match msci_calculator::calculate_enhanced(dataset, &msci_config) {
                Ok(result) => MarketResult::Enhanced(result),
                Err(err) => {
                    self.counters.record_error();
                    warn!(error = %err, "enhanced msci calculation failed");
                    MarketResult::Failed(err.to_string())
                }
            }
        } else {
            match msci_calculator::calculate(dataset, &msci_config) {
                Ok(result) => MarketResult::Original(result),
                Err(err) => {
                    self.counters.record_error();
                    warn!(error = %err, "msci calculation failed");
                    MarketResult::Failed(err.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_core::{Entity, Rating};

    fn token(r: Rating) -> String {
        match r {
            Rating::StrongBear => "strong_bear",
            Rating::MidBear => "mid_bear",
            Rating::SmallBear => "small_bear",
            Rating::MicroBear => "micro_bear",
            Rating::MicroBull => "micro_bull",
            Rating::SmallBull => "small_bull",
            Rating::MidBull => "mid_bull",
            Rating::StrongBull => "strong_bull",
        }
        .to_string()
    }

    fn dataset(days: usize, stocks: usize) -> Dataset {
        let dates: Vec<String> = (0..days).map(|i| format!("2024{i:04}")).collect();
        let rows = (0..stocks)
            .map(|i| {
                let industry = if i % 2 == 0 { "Tech" } else { "Energy" };
                let rating = if i % 3 == 0 { Rating::StrongBull } else { Rating::MidBull };
                (
                    Entity {
                        code: format!("E{i:03}"),
                        name: format!("Entity {i}"),
                        industry: industry.into(),
                    },
                    vec![token(rating); days],
                )
            })
            .collect();
        Dataset::from_rows(dates, rows).unwrap()
    }

    #[test]
    fn computes_full_analysis_for_a_small_dataset() {
        let engine = AnalysisEngine::new(EngineConfig::default(), dataset(10, 40));
        let results = engine.calculate_all_metrics("snap-1", false).unwrap();
        assert_eq!(results.metadata.total_stocks, 40);
        assert_eq!(results.metadata.total_industries, 2);
        assert!(matches!(results.market, MarketResult::Original(_)));
    }

    #[test]
    fn second_call_with_same_key_is_a_cache_hit() {
        let engine = AnalysisEngine::new(EngineConfig::default(), dataset(10, 40));
        engine.calculate_all_metrics("snap-1", false).unwrap();
        engine.calculate_all_metrics("snap-1", false).unwrap();
        assert_eq!(engine.performance_metrics().cache_hits, 1);
    }

    #[test]
    fn force_refresh_bypasses_cache() {
        let engine = AnalysisEngine::new(EngineConfig::default(), dataset(10, 40));
        engine.calculate_all_metrics("snap-1", false).unwrap();
        engine.calculate_all_metrics("snap-1", true).unwrap();
        assert_eq!(engine.performance_metrics().cache_misses, 2);
    }

    #[test]
    fn update_clears_cache_and_swaps_dataset() {
        let engine = AnalysisEngine::new(EngineConfig::default(), dataset(10, 40));
        engine.calculate_all_metrics("snap-1", false).unwrap();
        let status = engine.update(dataset(10, 20));
        assert_eq!(status.total_stocks, 20);
        let results = engine.calculate_all_metrics("snap-1", false).unwrap();
        assert_eq!(results.metadata.total_stocks, 20);
    }

    #[test]
    fn top_stocks_reads_from_latest_snapshot() {
        let engine = AnalysisEngine::new(EngineConfig::default(), dataset(10, 40));
        engine.calculate_all_metrics("snap-1", false).unwrap();
        let top = engine.top_stocks(StockMetric::Rtsi, 5);
        assert_eq!(top.len(), 5);
    }

    #[test]
    fn too_few_trading_days_yields_a_failed_market_reading_not_a_run_error() {
        let engine = AnalysisEngine::new(EngineConfig::default(), dataset(2, 40));
        let results = engine.calculate_all_metrics("snap-1", false).unwrap();
        assert!(matches!(results.market, MarketResult::Failed(_)));
    }
}
