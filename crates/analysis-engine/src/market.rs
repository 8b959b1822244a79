use serde::{Deserialize, Serialize};

use msci_calculator::{EnhancedMsciResult, MarketState, MsciResult, RiskLevel};

/// Market-wide reading, either the plain or the index-weighted MSCI variant
/// depending on `EngineConfig.msci.use_enhanced`. Kept as a tagged union
/// rather than forcing both shapes into one struct, since the enhanced
/// variant has no `volume_ratio`/`bull_bear_ratio` signal of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum MarketResult {
    Original(MsciResult),
    Enhanced(EnhancedMsciResult),
    /// §7: "MSCI failure yields a result with an error message but does not
    /// fail the run." Carries the reason so the run can still complete.
    Failed(String),
}

impl MarketResult {
    pub fn current_value(&self) -> f64 {
        match self {
            MarketResult::Original(r) => r.current_msci,
            MarketResult::Enhanced(r) => r.current_enhanced_msci,
            MarketResult::Failed(_) => 0.0,
        }
    }

    pub fn market_state(&self) -> MarketState {
        match self {
            MarketResult::Original(r) => r.market_state,
            MarketResult::Enhanced(r) => r.market_state,
            MarketResult::Failed(_) => MarketState::NeutralSentiment,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            MarketResult::Original(r) => r.risk_level,
            MarketResult::Enhanced(r) => r.risk_level,
            MarketResult::Failed(_) => RiskLevel::Medium,
        }
    }

    pub fn trend_5d(&self) -> f64 {
        match self {
            MarketResult::Original(r) => r.trend_5d,
            MarketResult::Enhanced(r) => r.trend_5d,
            MarketResult::Failed(_) => 0.0,
        }
    }
}
