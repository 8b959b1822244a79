pub mod aggregate;
pub mod config;
pub mod daily;
pub mod enhanced;
pub mod state;

pub use aggregate::{calculate, MsciResult};
pub use config::MsciConfig;
pub use daily::{calculate_daily, DailyMsci, ExtremeState};
pub use enhanced::{calculate as calculate_enhanced, EnhancedDailyMsci, EnhancedMsciResult};
pub use state::{assess_risk_level, determine_market_state, MarketState, RiskLevel};
