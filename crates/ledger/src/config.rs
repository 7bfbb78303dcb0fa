/// Ledger behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Check that subtotal and total add up before reserving stock.
    /// Non-negative amounts are always required.
    pub verify_totals: bool,
}

impl LedgerConfig {
    pub fn new(verify_totals: bool) -> Self {
        Self { verify_totals }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verify_totals: true,
        }
    }
}
