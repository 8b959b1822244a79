pub mod config;
pub mod irsi;

pub use config::IrsiConfig;
pub use irsi::{calculate, IrsiDailyResult, IrsiResult, IrsiStrength};
