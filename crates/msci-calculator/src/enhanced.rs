use serde::{Deserialize, Serialize};

use rating_core::{AnalysisError, Dataset};

use crate::aggregate::{state_duration_over, trend_over, volatility_over};
use crate::config::MsciConfig;
use crate::daily::{calculate_daily, round2};
use crate::state::{assess_risk_level, determine_market_state, MarketState, RiskLevel};

/// One day's index-weighted reading: the plain MSCI blended 80/20 with the
/// day's tracked-index average rating, boosted and capped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedDailyMsci {
    pub date: String,
    pub enhanced_msci: f64,
    pub original_msci: f64,
    pub index_rating: f64,
    pub index_rating_available: bool,
    pub interpolation_ratio: f64,
}

/// Full enhanced (index-weighted) MSCI reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedMsciResult {
    pub current_enhanced_msci: f64,
    pub market_state: MarketState,
    pub trend_5d: f64,
    pub volatility: f64,
    pub risk_level: RiskLevel,
    pub latest: EnhancedDailyMsci,
    pub history: Vec<EnhancedDailyMsci>,
    pub total_days: usize,
    pub current_state_duration_days: usize,
}

/// Averages `score_linear()` across entities whose industry label names a
/// tracked index, for one trading day. `(50.0, false)` when no such entity
/// carries a rating that day (including when none exist in the dataset at
/// all) — callers then carry the last known index rating forward.
fn index_average_rating(dataset: &Dataset, day: usize) -> (f64, bool) {
    let mut total = 0.0;
    let mut count = 0usize;
    for (entity, series) in dataset.entities.iter().zip(dataset.series.iter()) {
        if !entity.industry.to_lowercase().contains("index") {
            continue;
        }
        if let Some(rating) = series.cells[day] {
            total += rating.score_linear();
            count += 1;
        }
    }
    if count == 0 {
        (50.0, false)
    } else {
        (total / count as f64, true)
    }
}

/// Blends the plain MSCI with the index rating 20/80, then applies a flat
/// 1.15x boost capped at 80. Mirrors the index-weighted variant's actual
/// code path rather than its docstring, which describes a tiered
/// 1.10/1.15/1.20 coefficient scheme never reached in practice.
fn blend(original_msci: f64, index_rating: f64) -> f64 {
    let base = original_msci * 0.2 + index_rating * 0.8;
    round2((base * 1.15).min(80.0))
}

/// Computes the index-weighted MSCI series. Falls back to the baseline
/// MSCI value on days with no tracked-index rating, carrying the last known
/// index rating forward rather than resetting to neutral every gap.
pub fn calculate(dataset: &Dataset, config: &MsciConfig) -> Result<EnhancedMsciResult, AnalysisError> {
    if dataset.dates.is_empty() {
        return Err(AnalysisError::InputEmpty("dataset has no trading days".into()));
    }
    if dataset.dates.len() < 5 {
        return Err(AnalysisError::InsufficientData(format!(
            "need at least 5 trading days, found {}",
            dataset.dates.len()
        )));
    }

    let mut history = Vec::with_capacity(dataset.dates.len());
    let mut last_valid_index_rating = 50.0;

    for (day, date) in dataset.dates.iter().enumerate() {
        let cells: Vec<_> = dataset.series.iter().map(|s| s.cells[day]).collect();
        let Some(daily) = calculate_daily(date, &cells, config) else {
            continue;
        };

        let (index_rating, available) = index_average_rating(dataset, day);
        let effective_index_rating = if available {
            last_valid_index_rating = index_rating;
            index_rating
        } else {
            last_valid_index_rating
        };

        let enhanced_msci = blend(daily.msci, effective_index_rating);

        history.push(EnhancedDailyMsci {
            date: daily.date.clone(),
            enhanced_msci,
            original_msci: daily.msci,
            index_rating: round2(effective_index_rating),
            index_rating_available: available,
            interpolation_ratio: daily.interpolation_ratio,
        });
    }

    let latest = history
        .last()
        .cloned()
        .ok_or_else(|| AnalysisError::InsufficientData("no trading day met the rated-entity minimum".into()))?;

    let values: Vec<f64> = history.iter().map(|d| d.enhanced_msci).collect();
    let ratios: Vec<f64> = history.iter().map(|d| d.interpolation_ratio).collect();

    let trend_5d = trend_over(&values);
    let volatility = volatility_over(&values, &ratios);
    let market_state = determine_market_state(latest.enhanced_msci);
    // The index-weighted reading has no extreme-state signal of its own;
    // the underlying bull/bear concentration already feeds in through
    // `original_msci` before blending.
    let risk_level = assess_risk_level(market_state, crate::daily::ExtremeState::Normal, trend_5d);
    let current_state_duration_days = state_duration_over(&values);

    let total_days = history.len();
    let history_cap = config.history_cap.min(history.len());
    let capped_history = history.split_off(history.len() - history_cap);

    Ok(EnhancedMsciResult {
        current_enhanced_msci: latest.enhanced_msci,
        market_state,
        trend_5d,
        volatility,
        risk_level,
        latest,
        history: capped_history,
        total_days,
        current_state_duration_days,
    })
}
