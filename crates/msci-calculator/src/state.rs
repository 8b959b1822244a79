use serde::{Deserialize, Serialize};

use crate::daily::ExtremeState;

/// Seven-way read of the current MSCI level, 20-80 normal range plus the
/// two tail bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketState {
    /// >= 70: bubble-warning territory.
    ExtremeEuphoria,
    /// >= 60: a normal, healthy bull market.
    HealthyOptimism,
    /// >= 50: leaning optimistic.
    CautiousOptimism,
    /// >= 40: balanced.
    NeutralSentiment,
    /// >= 30: leaning pessimistic.
    MildPessimism,
    /// >= 23: early bear market.
    SignificantPessimism,
    /// < 23: capitulation / potential bottom.
    PanicSelling,
}

pub fn determine_market_state(msci: f64) -> MarketState {
    if msci >= 70.0 {
        MarketState::ExtremeEuphoria
    } else if msci >= 60.0 {
        MarketState::HealthyOptimism
    } else if msci >= 50.0 {
        MarketState::CautiousOptimism
    } else if msci >= 40.0 {
        MarketState::NeutralSentiment
    } else if msci >= 30.0 {
        MarketState::MildPessimism
    } else if msci >= 23.0 {
        MarketState::SignificantPessimism
    } else {
        MarketState::PanicSelling
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum BaseRisk {
    ExtremelyHigh,
    Low,
    Medium,
    MediumHigh,
    High,
    HighOpportunity,
}

fn base_risk(state: MarketState) -> BaseRisk {
    match state {
        MarketState::ExtremeEuphoria => BaseRisk::ExtremelyHigh,
        MarketState::HealthyOptimism => BaseRisk::Low,
        MarketState::CautiousOptimism => BaseRisk::Medium,
        MarketState::NeutralSentiment => BaseRisk::Medium,
        MarketState::MildPessimism => BaseRisk::MediumHigh,
        MarketState::SignificantPessimism => BaseRisk::High,
        MarketState::PanicSelling => BaseRisk::HighOpportunity,
    }
}

/// Risk verdict, keyed by (base risk from market state, whether an extreme
/// sentiment state is active, whether the 5-day trend swung sharply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    ExtremelyHighBubbleWarning,
    ExtremelyHighBubbleConfirmed,
    HighHighReturnBottomOpportunity,
    ContrarianOpportunityPanicBottom,
    High,
    ExtremelyHigh,
    MediumHigh,
    Medium,
    Low,
    MediumWatchExtremeSentiment,
}

/// Full three-dimensional lookup, unlike a loop that only ever matches the
/// first table row sharing `base_risk` regardless of the other two axes.
pub fn assess_risk_level(state: MarketState, extreme: ExtremeState, trend_5d: f64) -> RiskLevel {
    let base = base_risk(state);
    let extreme_adjustment = !matches!(extreme, ExtremeState::Normal);
    let trend_adjustment = trend_5d.abs() > 15.0;

    match (base, extreme_adjustment, trend_adjustment) {
        (BaseRisk::ExtremelyHigh, false, _) => RiskLevel::ExtremelyHighBubbleWarning,
        (BaseRisk::ExtremelyHigh, true, _) => RiskLevel::ExtremelyHighBubbleConfirmed,
        (BaseRisk::HighOpportunity, false, _) => RiskLevel::HighHighReturnBottomOpportunity,
        (BaseRisk::HighOpportunity, true, _) => RiskLevel::ContrarianOpportunityPanicBottom,
        (BaseRisk::High, false, _) => RiskLevel::High,
        (BaseRisk::High, true, _) => RiskLevel::ExtremelyHigh,
        (BaseRisk::MediumHigh, _, _) => RiskLevel::MediumHigh,
        (BaseRisk::Medium, _, _) => RiskLevel::Medium,
        (BaseRisk::Low, false, _) => RiskLevel::Low,
        (BaseRisk::Low, true, _) => RiskLevel::MediumWatchExtremeSentiment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_thresholds_match_boundaries() {
        assert_eq!(determine_market_state(70.0), MarketState::ExtremeEuphoria);
        assert_eq!(determine_market_state(69.9), MarketState::HealthyOptimism);
        assert_eq!(determine_market_state(22.9), MarketState::PanicSelling);
    }

    #[test]
    fn extreme_euphoria_with_extreme_state_is_confirmed_bubble() {
        let risk = assess_risk_level(MarketState::ExtremeEuphoria, ExtremeState::Bull, 0.0);
        assert_eq!(risk, RiskLevel::ExtremelyHighBubbleConfirmed);
    }

    #[test]
    fn healthy_optimism_without_extremes_is_low_risk() {
        let risk = assess_risk_level(MarketState::HealthyOptimism, ExtremeState::Normal, 2.0);
        assert_eq!(risk, RiskLevel::Low);
    }

    #[test]
    fn panic_selling_with_extreme_bear_is_contrarian_opportunity() {
        let risk = assess_risk_level(MarketState::PanicSelling, ExtremeState::Bear, -20.0);
        assert_eq!(risk, RiskLevel::ContrarianOpportunityPanicBottom);
    }
}
