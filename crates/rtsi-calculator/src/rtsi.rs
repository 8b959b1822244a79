use serde::{Deserialize, Serialize};

use rating_core::{AnalysisError, RatingSeries};

use crate::config::RtsiConfig;
use crate::ols;

/// Direction read off the fitted trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Upward,
    Downward,
    Sideways,
    /// Significance fell below 0.1: the slope isn't trustworthy either way.
    Unclear,
}

/// Rating Trend Strength Index for a single entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtsiResult {
    pub score: f64,
    pub trend: TrendDirection,
    /// Equal to `significance`: how much weight the trend direction deserves.
    pub confidence: f64,
    pub slope: f64,
    pub r_squared: f64,
    pub recent_score: u8,
    /// Mean of the most recent 5 scores minus the mean of the 5 before that
    /// (or the series' first score, if fewer than 10 points exist).
    pub score_change_5d: Option<f64>,
    /// The "older" half of the score_change_5d comparison, reported
    /// separately so callers can show both ends of the delta.
    pub older_window_avg: Option<f64>,
    pub data_points: usize,
    pub interpolation_ratio: f64,
    pub base_score_floor_applied: bool,
}

fn y_values(series: &RatingSeries) -> Vec<f64> {
    series
        .cells
        .iter()
        .map(|c| c.expect("series must be fully interpolated").score_ordinal() as f64)
        .collect()
}

fn trend_direction(slope: f64, significance: f64) -> TrendDirection {
    if significance < 0.1 {
        TrendDirection::Unclear
    } else if slope > 0.02 {
        TrendDirection::Upward
    } else if slope < -0.02 {
        TrendDirection::Downward
    } else {
        TrendDirection::Sideways
    }
}

fn score_change(y: &[f64], window: usize) -> (Option<f64>, Option<f64>) {
    if y.len() < window + 1 {
        return (None, None);
    }
    let recent_avg = y[y.len() - window..].iter().sum::<f64>() / window as f64;
    let older_avg = if y.len() >= window * 2 {
        let slice = &y[y.len() - window * 2..y.len() - window];
        slice.iter().sum::<f64>() / window as f64
    } else {
        y[0]
    };
    (Some(recent_avg - older_avg), Some(older_avg))
}

/// RATING_SCALE_MAX used to normalize amplitude: the ordinal range itself,
/// 0..7.
const RATING_SCALE_MAX: f64 = 7.0;

/// Computes the Rating Trend Strength Index for one entity's rating series.
///
/// `series` need not be pre-interpolated: this fills gaps internally using
/// the same bidirectional policy the dataset uses, so the two always agree.
pub fn calculate(series: &RatingSeries, config: &RtsiConfig) -> Result<RtsiResult, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::InputEmpty("rating series has no dates".into()));
    }

    let (filled, report) = series.interpolate();
    if filled.cells.iter().all(|c| c.is_none()) {
        return Err(AnalysisError::InsufficientData(
            "no valid ratings anywhere in the series".into(),
        ));
    }

    let y = y_values(&filled);
    if y.len() < config.min_data_points {
        return Err(AnalysisError::InsufficientData(format!(
            "need at least {} data points, found {}",
            config.min_data_points,
            y.len()
        )));
    }

    let fit = ols::fit(&y).ok_or_else(|| {
        AnalysisError::CalculationError("regression fit failed (degenerate series)".into())
    })?;

    let consistency = fit.r_squared;
    let significance = if fit.p_value < config.p_threshold {
        (1.0 - fit.p_value).max(0.0)
    } else {
        0.0
    };
    let amplitude = (fit.slope.abs() * y.len() as f64 / RATING_SCALE_MAX).min(1.0);

    let (w_consistency, w_significance, w_amplitude) = config.weights;
    let mut score = 100.0
        * (consistency * w_consistency + significance * w_significance + amplitude * w_amplitude);

    let mut floor_applied = false;
    if config.base_score_floor && score < 5.0 && (consistency > 0.1 || amplitude > 0.1) {
        score = score.max(5.0);
        floor_applied = true;
    }

    let trend = trend_direction(fit.slope, significance);
    let (score_change_5d, older_window_avg) = score_change(&y, 5);

    Ok(RtsiResult {
        score: round2(score),
        trend,
        confidence: round3(significance),
        slope: round4(fit.slope),
        r_squared: round3(consistency),
        recent_score: filled
            .cells
            .last()
            .expect("checked non-empty above")
            .expect("series must be fully interpolated")
            .score_ordinal(),
        score_change_5d: score_change_5d.map(round2),
        older_window_avg: older_window_avg.map(round2),
        data_points: y.len(),
        interpolation_ratio: round3(report.ratio()),
        base_score_floor_applied: floor_applied,
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_core::Rating;
    use std::sync::Arc;

    fn series_of(ratings: Vec<Option<Rating>>) -> RatingSeries {
        let dates: Arc<[String]> = (0..ratings.len()).map(|i| format!("d{i}")).collect();
        RatingSeries::new(dates, ratings)
    }

    #[test]
    fn empty_series_is_input_empty() {
        let series = RatingSeries::new(Arc::from([]), vec![]);
        assert!(matches!(
            calculate(&series, &RtsiConfig::default()),
            Err(AnalysisError::InputEmpty(_))
        ));
    }

    #[test]
    fn all_missing_is_insufficient_data() {
        let series = series_of(vec![None, None, None, None]);
        assert!(matches!(
            calculate(&series, &RtsiConfig::default()),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn below_min_points_is_insufficient_data() {
        let series = series_of(vec![Some(Rating::MidBull), Some(Rating::MidBull)]);
        assert!(matches!(
            calculate(&series, &RtsiConfig::default()),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn strong_consistent_upward_trend_scores_high_and_is_upward() {
        let series = series_of(vec![
            Some(Rating::StrongBear),
            Some(Rating::MidBear),
            Some(Rating::SmallBear),
            Some(Rating::MicroBear),
            Some(Rating::MicroBull),
            Some(Rating::SmallBull),
            Some(Rating::MidBull),
            Some(Rating::StrongBull),
        ]);
        let result = calculate(&series, &RtsiConfig::default()).unwrap();
        assert_eq!(result.trend, TrendDirection::Upward);
        assert!(result.score > 50.0);
        assert!(result.r_squared > 0.9);
    }

    #[test]
    fn flat_series_is_sideways_or_unclear_and_low_score() {
        let series = series_of(vec![Some(Rating::MicroBull); 6]);
        let result = calculate(&series, &RtsiConfig::default()).unwrap();
        assert!(matches!(
            result.trend,
            TrendDirection::Sideways | TrendDirection::Unclear
        ));
        assert!(result.score < 20.0);
    }

    #[test]
    fn base_score_floor_lifts_near_zero_scores() {
        // A short but perfectly monotonic series gets some consistency and
        // amplitude, so the floor should kick in rather than leaving a
        // near-zero score for an actual (if modest) trend.
        let series = series_of(vec![
            Some(Rating::MicroBear),
            Some(Rating::MicroBull),
            Some(Rating::SmallBull),
        ]);
        let result = calculate(&series, &RtsiConfig::default()).unwrap();
        assert!(result.score >= 5.0);
    }
}
