/// Tunables for [`crate::calculate`] and [`crate::calculate_enhanced`].
#[derive(Debug, Clone, Copy)]
pub struct RtsiConfig {
    pub min_data_points: usize,
    /// p-value below which a trend is taken as statistically significant.
    pub p_threshold: f64,
    /// (consistency, significance, amplitude) weights, must sum to 1.0.
    pub weights: (f64, f64, f64),
    /// Floor a near-zero score to 5.0 when there is at least weak
    /// consistency or amplitude, so real but faint trends don't read as
    /// indistinguishable from no data.
    pub base_score_floor: bool,
    /// Trailing window used by the enhanced variant; longer history beyond
    /// this is ignored.
    pub enhanced_time_window: usize,
}

impl Default for RtsiConfig {
    fn default() -> Self {
        Self {
            min_data_points: 3,
            p_threshold: 0.1,
            weights: (0.3, 0.3, 0.4),
            base_score_floor: true,
            enhanced_time_window: 60,
        }
    }
}
