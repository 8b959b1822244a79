use serde::{Deserialize, Serialize};

use rating_core::{stats, AnalysisError, RatingSeries};

use crate::config::RtsiConfig;
use crate::ols;

/// Enhanced RTSI: an alternate, richer scoring path over the same series,
/// weighted 55% toward average rating level rather than trend alone, with
/// tiered bonuses for data richness and a data-quality discount at the end.
///
/// Thresholds below are carried over from a variant whose ratings lived on
/// a 0-5 scale; they are rescaled here by 7/5 to fit this crate's 0-7
/// ordinal scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedRtsiResult {
    pub score: f64,
    pub base_enhanced_score: f64,
    pub optimized_score: f64,
    pub interpolation_quality: f64,
    pub interpolation_strategy: &'static str,
    pub quality_adjustment_factor: f64,
    pub enhanced_confidence: f64,
    pub data_points: usize,
}

const SCALE_ADJUST: f64 = 7.0 / 5.0;

fn ai_enhancement_factor(y: &[f64]) -> f64 {
    let mut pattern_score: f64 = 1.0;
    if y.len() >= 5 {
        let recent = stats::mean(&y[y.len() - 3..]);
        let early = stats::mean(&y[..3]);
        if recent - early > 0.5 * SCALE_ADJUST {
            pattern_score += 0.15;
        }
    }
    if stats::std_dev(y) < 0.5 * SCALE_ADJUST {
        pattern_score += 0.08;
    }
    pattern_score.min(1.35)
}

fn base_enhanced_score(y: &[f64]) -> Option<f64> {
    if y.len() < 3 {
        return None;
    }
    let mean_rating = stats::mean(y);
    let std_rating = stats::std_dev(y);
    let fit = ols::fit(y);
    let consistency = fit.map(|f| f.r_squared).unwrap_or(0.0);

    let rating_strength = mean_rating / 7.0;
    let volatility = (std_rating / (2.5 * SCALE_ADJUST)).min(1.0);

    let base = rating_strength * 0.55 + consistency * 0.25 + (1.0 - volatility) * 0.20;
    let score = base * ai_enhancement_factor(y);
    Some(score.clamp(0.0, 1.0))
}

fn optimize_score_range(base_enhanced: f64, y: &[f64]) -> f64 {
    let mut score = base_enhanced * 88.0;
    let mut bonus = 0.0;

    let n = y.len();
    bonus += if n >= 30 {
        8.0
    } else if n >= 20 {
        6.0
    } else if n >= 15 {
        5.0
    } else if n >= 10 {
        4.0
    } else if n >= 7 {
        3.0
    } else if n >= 5 {
        2.0
    } else {
        0.0
    };

    let avg_rating = stats::mean(y);
    bonus += if avg_rating >= 4.5 * SCALE_ADJUST {
        15.0
    } else if avg_rating >= 4.2 * SCALE_ADJUST {
        13.0
    } else if avg_rating >= 3.8 * SCALE_ADJUST {
        11.0
    } else if avg_rating >= 3.3 * SCALE_ADJUST {
        8.0
    } else if avg_rating >= 2.8 * SCALE_ADJUST {
        5.0
    } else if avg_rating >= 2.3 * SCALE_ADJUST {
        2.0
    } else if avg_rating >= 1.8 * SCALE_ADJUST {
        0.0
    } else if avg_rating < 1.5 * SCALE_ADJUST {
        -5.0
    } else {
        0.0
    };

    let rating_std = stats::std_dev(y);
    bonus += if rating_std <= 0.15 * SCALE_ADJUST {
        10.0
    } else if rating_std <= 0.4 * SCALE_ADJUST {
        8.0
    } else if rating_std <= 0.7 * SCALE_ADJUST {
        6.0
    } else if rating_std <= 1.1 * SCALE_ADJUST {
        4.0
    } else if rating_std <= 1.6 * SCALE_ADJUST {
        2.0
    } else if rating_std >= 2.5 * SCALE_ADJUST {
        -3.0
    } else {
        0.0
    };

    let mut excellent_conditions = 0;
    if avg_rating >= 4.3 * SCALE_ADJUST {
        excellent_conditions += 1;
    }
    if rating_std <= 0.5 * SCALE_ADJUST {
        excellent_conditions += 1;
    }
    if n >= 20 {
        excellent_conditions += 1;
    }

    if n >= 5 {
        let fit = ols::fit(y);
        let trend_consistency = fit.map(|f| f.r_squared).unwrap_or(0.0);
        let total_change = y[n - 1] - y[0];

        bonus += if total_change > 0.8 * SCALE_ADJUST && trend_consistency > 0.4 {
            10.0
        } else if total_change > 0.4 * SCALE_ADJUST && trend_consistency > 0.3 {
            7.0
        } else if total_change > 0.15 * SCALE_ADJUST && trend_consistency > 0.25 {
            4.0
        } else {
            0.0
        };

        if total_change > 0.4 * SCALE_ADJUST {
            excellent_conditions += 1;
        }
    }

    bonus += if excellent_conditions >= 4 {
        5.0
    } else if excellent_conditions >= 3 {
        3.0
    } else if excellent_conditions >= 2 {
        1.0
    } else {
        0.0
    };

    score += bonus;
    score.clamp(0.0, 100.0)
}

fn quality_adjustment(optimized_score: f64, interpolation_quality: f64) -> f64 {
    let factor = if interpolation_quality >= 0.9 {
        1.0
    } else if interpolation_quality >= 0.75 {
        0.98
    } else if interpolation_quality >= 0.6 {
        0.96
    } else if interpolation_quality >= 0.4 {
        0.94
    } else {
        0.90
    };

    let adjusted = optimized_score * factor;
    let floor = if interpolation_quality >= 0.6 {
        (optimized_score * 0.03).max(0.0)
    } else {
        0.0
    };
    adjusted.max(floor).min(100.0)
}

/// Computes the enhanced variant of the index.
pub fn calculate_enhanced(
    series: &RatingSeries,
    config: &RtsiConfig,
) -> Result<EnhancedRtsiResult, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::InputEmpty("rating series has no dates".into()));
    }

    let window_start = series.cells.len().saturating_sub(config.enhanced_time_window);
    let windowed = RatingSeries::new(
        series.dates[window_start..].to_vec().into(),
        series.cells[window_start..].to_vec(),
    );

    let (filled, report) = windowed.interpolate();
    let y: Vec<f64> = filled
        .cells
        .iter()
        .map(|c| c.map(|r| r.score_ordinal() as f64).unwrap_or(3.5))
        .collect();

    if y.len() < 3 {
        return Err(AnalysisError::InsufficientData(format!(
            "need at least 3 data points, found {}",
            y.len()
        )));
    }

    let base = base_enhanced_score(&y)
        .ok_or_else(|| AnalysisError::CalculationError("enhanced base score failed".into()))?;
    let optimized = optimize_score_range(base, &y);

    let interpolation_quality = 1.0 - report.ratio();
    let quality_adjusted = quality_adjustment(optimized, interpolation_quality);

    let quality_adjustment_factor = if optimized > 0.0 {
        quality_adjusted / optimized
    } else {
        1.0
    };

    let enhanced_confidence = (interpolation_quality + (quality_adjusted / 100.0) * 0.3).min(1.0);

    Ok(EnhancedRtsiResult {
        score: round2(quality_adjusted),
        base_enhanced_score: base,
        optimized_score: round2(optimized),
        interpolation_quality: round3(interpolation_quality),
        interpolation_strategy: "bidirectional",
        quality_adjustment_factor: round3(quality_adjustment_factor),
        enhanced_confidence: round3(enhanced_confidence),
        data_points: y.len(),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
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
    fn below_three_points_is_insufficient_data() {
        let series = series_of(vec![Some(Rating::MidBull), Some(Rating::MidBull)]);
        assert!(matches!(
            calculate_enhanced(&series, &RtsiConfig::default()),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn score_stays_in_bounds() {
        let series = series_of(vec![
            Some(Rating::StrongBull),
            Some(Rating::StrongBull),
            Some(Rating::StrongBull),
            Some(Rating::StrongBull),
            Some(Rating::StrongBull),
        ]);
        let result = calculate_enhanced(&series, &RtsiConfig::default()).unwrap();
        assert!(result.score >= 0.0 && result.score <= 100.0);
    }

    #[test]
    fn interpolation_quality_degrades_with_more_missing_cells() {
        let dense = series_of(vec![
            Some(Rating::MidBull),
            Some(Rating::MidBull),
            Some(Rating::MidBull),
            Some(Rating::MidBull),
        ]);
        let sparse = series_of(vec![Some(Rating::MidBull), None, None, Some(Rating::MidBull)]);
        let dense_result = calculate_enhanced(&dense, &RtsiConfig::default()).unwrap();
        let sparse_result = calculate_enhanced(&sparse, &RtsiConfig::default()).unwrap();
        assert!(dense_result.interpolation_quality > sparse_result.interpolation_quality);
    }
}
