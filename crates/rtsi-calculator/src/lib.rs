pub mod config;
pub mod enhanced;
pub mod ols;
pub mod rtsi;

pub use config::RtsiConfig;
pub use enhanced::{calculate_enhanced, EnhancedRtsiResult};
pub use rtsi::{calculate, RtsiResult, TrendDirection};
