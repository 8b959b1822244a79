use serde::{Deserialize, Serialize};

use crate::results::AnalysisResults;

/// Field `top_stocks` ranks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockMetric {
    Rtsi,
    /// score_change_5d, missing values coerced to 0.
    ScoreChange5d,
}

/// One row of a ranking view: code/name plus the metric value it was
/// ranked on, so callers don't have to re-look-up the full entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStock {
    pub code: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedIndustry {
    pub label: String,
    pub value: f64,
}

fn stock_metric_value(entry: &crate::results::StockEntry, metric: StockMetric) -> f64 {
    match metric {
        StockMetric::Rtsi => entry.rtsi.score,
        StockMetric::ScoreChange5d => entry.rtsi.score_change_5d.unwrap_or(0.0),
    }
}

/// §4.6.3: the `n` stocks with highest `metric`, ties broken by code
/// ascending. Tolerates missing numerics (coerced to 0) rather than
/// erroring on a partial row.
pub fn top_stocks(results: &AnalysisResults, metric: StockMetric, n: usize) -> Vec<RankedStock> {
    let mut rows: Vec<RankedStock> = results
        .stocks
        .iter()
        .map(|(code, entry)| RankedStock {
            code: code.clone(),
            name: entry.name.clone(),
            value: stock_metric_value(entry, metric),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.code.cmp(&b.code))
    });
    rows.truncate(n);
    rows
}

/// §4.6.3: the `n` industries with highest IRSI, ties broken by label
/// ascending.
pub fn top_industries(results: &AnalysisResults, n: usize) -> Vec<RankedIndustry> {
    let mut rows: Vec<RankedIndustry> = results
        .industries
        .iter()
        .map(|(label, entry)| RankedIndustry {
            label: label.clone(),
            value: entry.irsi.mean_irsi,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketResult;
    use crate::results::{AnalysisMetadata, IndustryEntry, StockEntry};
    use irsi_calculator::{IrsiResult, IrsiStrength};
    use msci_calculator::MsciResult;
    use rtsi_calculator::{RtsiResult, TrendDirection};
    use std::collections::HashMap;

    fn stock(code: &str, rtsi: f64) -> (String, StockEntry) {
        (
            code.to_string(),
            StockEntry {
                name: format!("{code} Inc"),
                industry: "Tech".into(),
                rtsi: RtsiResult {
                    score: rtsi,
                    trend: TrendDirection::Upward,
                    confidence: 0.9,
                    slope: 0.1,
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

    fn empty_results() -> AnalysisResults {
        AnalysisResults {
            stocks: HashMap::new(),
            industries: HashMap::new(),
            market: MarketResult::Original(dummy_msci()),
            metadata: AnalysisMetadata {
                total_stocks: 0,
                total_industries: 0,
                calculation_time_s: 0.0,
                cache_hit_rate: 0.0,
                performance_metrics: crate::counters::PerformanceCounters::default().snapshot(),
            },
        }
    }

    fn dummy_msci() -> MsciResult {
        let dataset = test_dataset();
        msci_calculator::calculate(&dataset, &msci_calculator::MsciConfig::default()).unwrap()
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

    #[test]
    fn top_stocks_is_sorted_and_bounded() {
        let mut results = empty_results();
        results.stocks.extend([stock("B", 50.0), stock("A", 80.0), stock("C", 80.0)]);
        let top = top_stocks(&results, StockMetric::Rtsi, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "A");
        assert_eq!(top[1].code, "C");
    }

    #[test]
    fn top_stocks_returns_min_of_k_and_len() {
        let mut results = empty_results();
        results.stocks.extend([stock("A", 10.0)]);
        assert_eq!(top_stocks(&results, StockMetric::Rtsi, 5).len(), 1);
    }

    #[test]
    fn top_industries_ties_break_by_label() {
        let mut results = empty_results();
        results.industries.insert(
            "Zeta".into(),
            IndustryEntry {
                irsi: sample_irsi(10.0),
                stock_count: 1,
                stocks: vec![],
                status: IrsiStrength::Outperform,
            },
        );
        results.industries.insert(
            "Alpha".into(),
            IndustryEntry {
                irsi: sample_irsi(10.0),
                stock_count: 1,
                stocks: vec![],
                status: IrsiStrength::Outperform,
            },
        );
        let top = top_industries(&results, 2);
        assert_eq!(top[0].label, "Alpha");
        assert_eq!(top[1].label, "Zeta");
    }

    fn sample_irsi(mean_irsi: f64) -> IrsiResult {
        IrsiResult {
            daily: vec![],
            mean_irsi,
            latest_irsi: mean_irsi,
            strength: IrsiStrength::Outperform,
            data_points: 1,
        }
    }
}
