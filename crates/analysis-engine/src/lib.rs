pub mod cache;
pub mod config;
pub mod counters;
pub mod engine;
pub mod market;
pub mod ranking;
pub mod results;
pub mod trend;

pub use config::EngineConfig;
pub use engine::{AnalysisEngine, UpdateStatus};
pub use market::MarketResult;
pub use ranking::{RankedIndustry, RankedStock, StockMetric};
pub use results::{AnalysisMetadata, AnalysisResults, IndustryEntry, IndustryMember, StockEntry};
pub use trend::TrendSignal;
