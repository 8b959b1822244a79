use serde::{Deserialize, Serialize};

use irsi_calculator::IrsiConfig;
use msci_calculator::MsciConfig;
use rtsi_calculator::RtsiConfig;

/// Per-stock RTSI tunables plus the engine-level "enhanced" toggle (§6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RtsiSettings {
    pub min_data_points: usize,
    pub p_threshold: f64,
    pub weights: (f64, f64, f64),
    pub base_floor: bool,
    pub time_window: usize,
    /// Enables the optimized/enhanced reshaping alongside the base score.
    pub enhanced: bool,
}

impl Default for RtsiSettings {
    fn default() -> Self {
        let base = RtsiConfig::default();
        Self {
            min_data_points: base.min_data_points,
            p_threshold: base.p_threshold,
            weights: base.weights,
            base_floor: base.base_score_floor,
            time_window: base.enhanced_time_window,
            enhanced: true,
        }
    }
}

impl From<RtsiSettings> for RtsiConfig {
    fn from(s: RtsiSettings) -> Self {
        RtsiConfig {
            min_data_points: s.min_data_points,
            p_threshold: s.p_threshold,
            weights: s.weights,
            base_score_floor: s.base_floor,
            enhanced_time_window: s.time_window,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IrsiSettings {
    pub min_stocks: usize,
}

impl Default for IrsiSettings {
    fn default() -> Self {
        let base = IrsiConfig::default();
        Self {
            min_stocks: base.min_stocks,
        }
    }
}

impl From<IrsiSettings> for IrsiConfig {
    fn from(s: IrsiSettings) -> Self {
        IrsiConfig { min_stocks: s.min_stocks }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MsciSettings {
    pub min_rated_per_day: usize,
    pub use_enhanced: bool,
    pub volume_ratio_jitter: bool,
}

impl Default for MsciSettings {
    fn default() -> Self {
        let base = MsciConfig::default();
        Self {
            min_rated_per_day: base.min_rated,
            use_enhanced: false,
            volume_ratio_jitter: base.volume_jitter_enabled,
        }
    }
}

impl From<MsciSettings> for MsciConfig {
    fn from(s: MsciSettings) -> Self {
        MsciConfig {
            min_rated: s.min_rated_per_day,
            history_cap: MsciConfig::default().history_cap,
            volume_jitter_enabled: s.volume_ratio_jitter,
        }
    }
}

/// Top-level engine configuration, mirroring spec.md §6's external
/// configuration table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cache_ttl_s: i64,
    pub max_workers: usize,
    pub timeout_s: i64,
    /// Toggles per-stock parallelism (§4.6.2). Not itemized in spec.md's
    /// config table, which only lists `max_workers`; on by default since
    /// the teacher's analysis crates default to using rayon.
    pub parallel: bool,
    pub rtsi: RtsiSettings,
    pub irsi: IrsiSettings,
    pub msci: MsciSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_s: 300,
            max_workers: 4,
            timeout_s: 300,
            parallel: true,
            rtsi: RtsiSettings::default(),
            irsi: IrsiSettings::default(),
            msci: MsciSettings::default(),
        }
    }
}
