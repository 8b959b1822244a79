use serde::{Deserialize, Serialize};

use rating_core::{Rating, RatingCell};

use crate::config::MsciConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremeState {
    Bull,
    Bear,
    Normal,
}

/// One trading day's market-wide rating snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMsci {
    pub date: String,
    pub msci: f64,
    pub sentiment_score: f64,
    pub bull_bear_ratio: f64,
    pub participation: f64,
    pub extreme_state: ExtremeState,
    pub total_rated: usize,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub interpolation_ratio: f64,
    pub data_quality_warnings: Vec<String>,
    pub total_entities: usize,
    pub missing_count: usize,
}

fn is_bullish(r: Rating) -> bool {
    matches!(
        r,
        Rating::MicroBull | Rating::SmallBull | Rating::MidBull | Rating::StrongBull
    )
}

fn is_bearish(r: Rating) -> bool {
    matches!(
        r,
        Rating::MicroBear | Rating::SmallBear | Rating::MidBear | Rating::StrongBear
    )
}

/// Computes one day's MSCI reading from every entity's rating cell on that
/// date. Returns `None` when fewer than `config.min_rated` entities carry a
/// real rating that day — too thin a sample to mean anything.
pub fn calculate_daily(date: &str, cells: &[RatingCell], config: &MsciConfig) -> Option<DailyMsci> {
    let total_entities = cells.len();
    let missing_count = cells.iter().filter(|c| c.is_none()).count();
    let interpolation_ratio = if total_entities > 0 {
        missing_count as f64 / total_entities as f64
    } else {
        0.0
    };

    let rated: Vec<Rating> = cells.iter().filter_map(|c| *c).collect();
    let total_rated = rated.len();
    if total_rated < config.min_rated {
        return None;
    }

    let bullish_count = rated.iter().filter(|r| is_bullish(**r)).count();
    let bearish_count = rated.iter().filter(|r| is_bearish(**r)).count();
    let bull_bear_ratio = if bearish_count > 0 {
        (bullish_count as f64 / bearish_count as f64).min(10.0)
    } else {
        10.0
    };

    let weighted_score: f64 = rated.iter().map(|r| r.score_linear()).sum();
    let avg_sentiment = weighted_score / total_rated as f64;

    let participation = total_rated as f64 / total_entities as f64;

    let extreme_bull = rated.iter().filter(|r| **r == Rating::StrongBull).count() as f64
        / total_entities as f64
        > 0.02;
    let extreme_bear = rated.iter().filter(|r| **r == Rating::MidBear).count() as f64
        / total_entities as f64
        > 0.25;

    let sentiment_norm = (avg_sentiment - 12.5) / 87.5;
    let ratio_norm = (bull_bear_ratio / 2.0).min(1.0);
    let participation_norm = (participation / 0.5).min(1.0);

    let mut msci = (sentiment_norm * 0.5 + ratio_norm * 0.3 + participation_norm * 0.2) * 100.0;

    if extreme_bull {
        msci = (msci + 10.0).min(100.0);
    }
    if extreme_bear {
        msci = (msci - 15.0).max(0.0);
    }

    let mut warnings = Vec::new();
    if interpolation_ratio > 0.3 {
        warnings.push(format!(
            "data quality warning: interpolation ratio is high ({:.1}%)",
            interpolation_ratio * 100.0
        ));
    }
    if interpolation_ratio > 0.5 {
        warnings.push(
            "severe warning: over half the day's ratings are interpolated, results are unreliable"
                .to_string(),
        );
    }

    Some(DailyMsci {
        date: date.to_string(),
        msci: round2(msci),
        sentiment_score: round2(avg_sentiment),
        bull_bear_ratio: round2(bull_bear_ratio),
        participation: round3(participation),
        extreme_state: if extreme_bull {
            ExtremeState::Bull
        } else if extreme_bear {
            ExtremeState::Bear
        } else {
            ExtremeState::Normal
        },
        total_rated,
        bullish_count,
        bearish_count,
        interpolation_ratio: round3(interpolation_ratio),
        data_quality_warnings: warnings,
        total_entities,
        missing_count,
    })
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
