/// Tunables for [`crate::calculate`].
#[derive(Debug, Clone, Copy)]
pub struct IrsiConfig {
    /// Minimum member stocks an industry needs before it is considered at
    /// all; below this, the industry is skipped entirely upstream.
    pub min_stocks: usize,
}

impl Default for IrsiConfig {
    fn default() -> Self {
        Self { min_stocks: 2 }
    }
}
