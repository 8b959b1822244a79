use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use rating_core::{stats, AnalysisError, Dataset};

use crate::config::MsciConfig;
use crate::daily::{calculate_daily, round2, round3, DailyMsci};
use crate::state::{assess_risk_level, determine_market_state, MarketState, RiskLevel};

/// Full market-wide MSCI reading: the latest day's snapshot plus trend,
/// volatility, and risk context derived from the whole history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsciResult {
    pub current_msci: f64,
    pub market_state: MarketState,
    pub trend_5d: f64,
    pub volatility: f64,
    pub volume_ratio: f64,
    pub risk_level: RiskLevel,
    pub latest: DailyMsci,
    /// Most recent `config.history_cap` daily readings.
    pub history: Vec<DailyMsci>,
    pub total_days: usize,
    pub avg_interpolation_ratio: f64,
    pub data_quality_warnings: Vec<String>,
    pub current_state_duration_days: usize,
}

/// Trend over the last two 5-day windows of MSCI values.
pub(crate) fn trend_over(values: &[f64]) -> f64 {
    if values.len() < 10 {
        return 0.0;
    }
    let recent = &values[values.len() - 5..];
    let previous = &values[values.len() - 10..values.len() - 5];
    round2(stats::mean(recent) - stats::mean(previous))
}

/// Weighted volatility over the last 10 MSCI values, discounting days with
/// a high interpolation ratio.
pub(crate) fn volatility_over(values: &[f64], interpolation_ratios: &[f64]) -> f64 {
    if values.len() < 5 {
        return 0.0;
    }
    let start = values.len().saturating_sub(10);
    let values = &values[start..];
    let ratios = &interpolation_ratios[start..];
    let weights: Vec<f64> = ratios.iter().map(|r| (1.0 - r * 0.5).max(0.3)).collect();

    let weighted_mean = stats::weighted_mean(values, &weights);
    let weight_sum: f64 = weights.iter().sum();
    let weighted_variance = if weight_sum > f64::EPSILON {
        values
            .iter()
            .zip(&weights)
            .map(|(v, w)| w * (v - weighted_mean).powi(2))
            .sum::<f64>()
            / weight_sum
    } else {
        0.0
    };

    round2((weighted_variance.sqrt() * 2.0).min(50.0))
}

fn calculate_trend(history: &[DailyMsci]) -> f64 {
    trend_over(&history.iter().map(|d| d.msci).collect::<Vec<_>>())
}

fn calculate_volatility(history: &[DailyMsci]) -> f64 {
    let values: Vec<f64> = history.iter().map(|d| d.msci).collect();
    let ratios: Vec<f64> = history.iter().map(|d| d.interpolation_ratio).collect();
    volatility_over(&values, &ratios)
}

fn calculate_volume_ratio(latest: &DailyMsci, jitter_enabled: bool) -> f64 {
    let mut ratio = latest.participation * 2.0;
    if jitter_enabled {
        ratio += rand::thread_rng().gen_range(-0.2..=0.2);
    }
    round2(ratio.clamp(0.1, 5.0))
}

/// How many consecutive trailing days (from the end) share the current
/// day's market state.
pub(crate) fn state_duration_over(msci_values: &[f64]) -> usize {
    let Some(&latest) = msci_values.last() else {
        return 0;
    };
    let current_state = determine_market_state(latest);
    let mut duration = 1;
    for &v in msci_values[..msci_values.len() - 1].iter().rev() {
        if determine_market_state(v) == current_state {
            duration += 1;
        } else {
            break;
        }
    }
    duration
}

fn current_state_duration(history: &[DailyMsci]) -> usize {
    state_duration_over(&history.iter().map(|d| d.msci).collect::<Vec<_>>())
}

/// Computes the full Market Sentiment Composite Index series for a dataset,
/// one reading per trading day, plus the trend/volatility/risk summary for
/// the most recent day.
pub fn calculate(dataset: &Dataset, config: &MsciConfig) -> Result<MsciResult, AnalysisError> {
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
    for (day, date) in dataset.dates.iter().enumerate() {
        let cells: Vec<_> = dataset.series.iter().map(|s| s.cells[day]).collect();
        if let Some(daily) = calculate_daily(date, &cells, config) {
            history.push(daily);
        }
    }

    let latest = history
        .last()
        .cloned()
        .ok_or_else(|| AnalysisError::InsufficientData("no trading day met the rated-entity minimum".into()))?;

    let trend_5d = calculate_trend(&history);
    let volatility = calculate_volatility(&history);
    let volume_ratio = calculate_volume_ratio(&latest, config.volume_jitter_enabled);
    let market_state = determine_market_state(latest.msci);
    let risk_level = assess_risk_level(market_state, latest.extreme_state, trend_5d);

    let avg_interpolation_ratio =
        round3(stats::mean(&history.iter().map(|d| d.interpolation_ratio).collect::<Vec<_>>()));

    let mut warnings: HashSet<String> = HashSet::new();
    for day in history.iter().rev().take(5) {
        warnings.extend(day.data_quality_warnings.iter().cloned());
    }
    if avg_interpolation_ratio > 0.3 {
        warnings.insert(format!(
            "overall data quality notice: average interpolation ratio {:.1}%",
            avg_interpolation_ratio * 100.0
        ));
    }
    if avg_interpolation_ratio > 0.5 {
        warnings.insert("severe data quality warning: check source data completeness".to_string());
    }

    let current_state_duration_days = current_state_duration(&history);
    let total_days = history.len();
    let history_cap = config.history_cap.min(history.len());
    let capped_history = history.split_off(history.len() - history_cap);

    Ok(MsciResult {
        current_msci: latest.msci,
        market_state,
        trend_5d,
        volatility,
        volume_ratio,
        risk_level,
        latest,
        history: capped_history,
        total_days,
        avg_interpolation_ratio,
        data_quality_warnings: warnings.into_iter().collect(),
        current_state_duration_days,
    })
}
