use serde::{Deserialize, Serialize};

use irsi_calculator::IrsiStrength;
use msci_calculator::MarketState;
use rtsi_calculator::TrendDirection;

use crate::results::AnalysisResults;

/// One emitted signal from §4.6.7's trend-change scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendSignal {
    StockBullish { code: String, rtsi: f64, confidence: f64 },
    StockBearish { code: String, rtsi: f64, confidence: f64 },
    IndustryRotation { industry: String, irsi: f64 },
    MarketExtreme { state: MarketState },
}

const MAX_SIGNALS: usize = 50;

/// Scans a computed `AnalysisResults` for the four signal kinds in §4.6.7,
/// bounded to the first 50. Stocks and industries are walked in sorted-key
/// order so the output is deterministic across runs over the same input.
pub fn detect_trend_changes(results: &AnalysisResults) -> Vec<TrendSignal> {
    let mut signals = Vec::new();

    let mut codes: Vec<&String> = results.stocks.keys().collect();
    codes.sort();
    for code in codes {
        let entry = &results.stocks[code];
        if signals.len() >= MAX_SIGNALS {
            break;
        }
        if entry.rtsi.score > 70.0 && entry.trend == TrendDirection::Upward && entry.rtsi.confidence > 0.7 {
            signals.push(TrendSignal::StockBullish {
                code: code.clone(),
                rtsi: entry.rtsi.score,
                confidence: entry.rtsi.confidence,
            });
        } else if entry.rtsi.score < 20.0 && entry.trend == TrendDirection::Downward && entry.rtsi.confidence > 0.7 {
            signals.push(TrendSignal::StockBearish {
                code: code.clone(),
                rtsi: entry.rtsi.score,
                confidence: entry.rtsi.confidence,
            });
        }
    }

    let mut industries: Vec<&String> = results.industries.keys().collect();
    industries.sort();
    for label in industries {
        if signals.len() >= MAX_SIGNALS {
            break;
        }
        let entry = &results.industries[label];
        if entry.irsi.mean_irsi > 30.0 && entry.status == IrsiStrength::StrongOutperform {
            signals.push(TrendSignal::IndustryRotation {
                industry: label.clone(),
                irsi: entry.irsi.mean_irsi,
            });
        }
    }

    if signals.len() < MAX_SIGNALS {
        let state = results.market.market_state();
        if matches!(state, MarketState::ExtremeEuphoria | MarketState::PanicSelling) {
            signals.push(TrendSignal::MarketExtreme { state });
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::PerformanceCounters;
    use crate::market::MarketResult;
    use crate::results::{AnalysisMetadata, StockEntry};
    use rtsi_calculator::RtsiResult;
    use std::collections::HashMap;

    fn bullish_stock(code: &str) -> (String, StockEntry) {
        (
            code.to_string(),
            StockEntry {
                name: code.to_string(),
                industry: "Tech".into(),
                rtsi: RtsiResult {
                    score: 85.0,
                    trend: TrendDirection::Upward,
                    confidence: 0.9,
                    slope: 0.5,
                    r_squared: 0.9,
                    recent_score: 7,
                    score_change_5d: None,
                    older_window_avg: None,
                    data_points: 10,
                    interpolation_ratio: 0.0,
                    base_score_floor_applied: false,
                },
                last_score: 7,
                trend: TrendDirection::Upward,
            },
        )
    }

    fn test_dataset() -> rating_core::Dataset {
        let dates: Vec<String> = (0..6).map(|i| format!("2024010{i}")).collect();
        let rows = (0..40)
            .map(|i| {
                (
                    rating_core::Entity {
                        code: format!("E{i}"),
                        name: format!("Entity {i}"),
                        industry: "Tech".into(),
                    },
                    vec!["mid_bull".to_string(); 6],
                )
            })
            .collect();
        rating_core::Dataset::from_rows(dates, rows).unwrap()
    }

    fn empty_results() -> AnalysisResults {
        let dataset = test_dataset();
        let market = msci_calculator::calculate(&dataset, &msci_calculator::MsciConfig::default()).unwrap();
        AnalysisResults {
            stocks: HashMap::new(),
            industries: HashMap::new(),
            market: MarketResult::Original(market),
            metadata: AnalysisMetadata {
                total_stocks: 0,
                total_industries: 0,
                calculation_time_s: 0.0,
                cache_hit_rate: 0.0,
                performance_metrics: PerformanceCounters::default().snapshot(),
            },
        }
    }

    #[test]
    fn bullish_stock_emits_signal() {
        let mut results = empty_results();
        results.stocks.extend([bullish_stock("A")]);
        let signals = detect_trend_changes(&results);
        assert!(matches!(signals[0], TrendSignal::StockBullish { .. }));
    }

    #[test]
    fn low_confidence_bullish_stock_is_silent() {
        let mut results = empty_results();
        let (code, mut entry) = bullish_stock("A");
        entry.rtsi.confidence = 0.5;
        results.stocks.insert(code, entry);
        assert!(!detect_trend_changes(&results)
            .iter()
            .any(|s| matches!(s, TrendSignal::StockBullish { .. } | TrendSignal::StockBearish { .. })));
    }

    #[test]
    fn signals_are_bounded_to_fifty() {
        let mut results = empty_results();
        for i in 0..80 {
            results.stocks.extend([bullish_stock(&format!("S{i:03}"))]);
        }
        assert_eq!(detect_trend_changes(&results).len(), MAX_SIGNALS);
    }
}
