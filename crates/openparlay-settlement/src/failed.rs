//! Failed-conversion ledger.
//!
//! Amounts the pool-conversion phase could not place are recorded here
//! per token (global, not per-epoch — two epochs' failures in the same
//! token pool together) and recovered later by an administrative sweep,
//! which zeroes the entry. Nothing is ever silently dropped: every
//! recorded amount has a matching balance under the vault's failed pool.

use std::collections::HashMap;

use openparlay_types::Token;
use rust_decimal::Decimal;

/// Per-token totals awaiting recovery.
#[derive(Debug, Default)]
pub struct FailedConversionLedger {
    amounts: HashMap<Token, Decimal>,
}

impl FailedConversionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an amount a conversion attempt could not place.
    pub fn record(&mut self, token: &str, amount: Decimal) {
        if amount.is_zero() {
            return;
        }
        *self
            .amounts
            .entry(token.to_string())
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Recorded total for one token.
    #[must_use]
    pub fn balance(&self, token: &str) -> Decimal {
        self.amounts.get(token).copied().unwrap_or(Decimal::ZERO)
    }

    /// Drain the entry for `token`, returning what was recorded.
    pub fn sweep(&mut self, token: &str) -> Decimal {
        self.amounts.remove(token).unwrap_or(Decimal::ZERO)
    }

    /// Tokens with a nonzero recorded amount.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.amounts.keys().cloned().collect()
    }
}
