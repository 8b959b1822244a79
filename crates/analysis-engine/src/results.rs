use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use rtsi_calculator::{RtsiResult, TrendDirection};

use crate::counters::PerformanceMetrics;
use crate::market::MarketResult;

/// Per-stock entry in `AnalysisResults.stocks`, §6's outbound JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub name: String,
    pub industry: String,
    pub rtsi: RtsiResult,
    pub last_score: u8,
    pub trend: TrendDirection,
}

/// One of up to 10 representative members attached to an `IndustryEntry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryMember {
    pub code: String,
    pub name: String,
    pub rtsi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryEntry {
    pub irsi: irsi_calculator::IrsiResult,
    pub stock_count: usize,
    /// Up to 10 representative members, highest RTSI first.
    pub stocks: Vec<IndustryMember>,
    pub status: irsi_calculator::IrsiStrength,
}

/// §6 `metadata` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub total_stocks: usize,
    pub total_industries: usize,
    pub calculation_time_s: f64,
    pub cache_hit_rate: f64,
    pub performance_metrics: PerformanceMetrics,
}

/// Top-level container assembled by `AnalysisEngine::calculate_all_metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub stocks: HashMap<String, StockEntry>,
    pub industries: HashMap<String, IndustryEntry>,
    pub market: MarketResult,
    pub metadata: AnalysisMetadata,
}
