/// Tunables for [`crate::calculate`].
#[derive(Debug, Clone, Copy)]
pub struct MsciConfig {
    /// Minimum rated entities on a trading day for that day to count at all.
    pub min_rated: usize,
    /// How many of the most recent daily readings to keep in the returned
    /// history (the underlying calculation still uses the full series).
    pub history_cap: usize,
    /// Add a small random jitter to `volume_ratio`, mirroring a simulated
    /// trading-activity signal. Off by default so results stay
    /// deterministic; callers doing a live dashboard can opt in.
    pub volume_jitter_enabled: bool,
}

impl Default for MsciConfig {
    fn default() -> Self {
        Self {
            min_rated: 30,
            history_cap: 30,
            volume_jitter_enabled: false,
        }
    }
}
