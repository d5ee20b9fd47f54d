//! Reward-points ledger seam.
//!
//! Durable persistence of balances across sessions belongs to an external
//! collaborator; the core only ever credits a fixed win reward and reads the
//! current balance. [`MemoryLedger`] backs tests and standalone runs.

use std::collections::HashMap;

/// The two operations the core needs from the points collaborator.
pub trait PointsLedger: Send {
    /// Add `amount` points to the account identified by `glyph`.
    fn credit(&mut self, glyph: &str, amount: u32);

    /// Current balance for `glyph`; zero for unknown accounts.
    fn balance(&self, glyph: &str) -> u32;
}

/// In-memory ledger. Balances live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: HashMap<String, u32>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointsLedger for MemoryLedger {
    fn credit(&mut self, glyph: &str, amount: u32) {
        *self.balances.entry(glyph.to_string()).or_insert(0) += amount;
    }

    fn balance(&self, glyph: &str) -> u32 {
        self.balances.get(glyph).copied().unwrap_or(0)
    }
}
