//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced over the vault:
//! ```text
//! ∀ token: Σ holdings(holder, token) == Σ(inflows) - Σ(outflows)
//! ```
//! where inflows are external deposits plus conversion outputs delivered
//! into the vault, and outflows are external withdrawals plus conversion
//! inputs handed to an exchange.
//!
//! If this invariant ever breaks, something has gone catastrophically
//! wrong in the escrow/settlement accounting — it is the ultimate safety
//! net behind the dust-free distribution rules.

use std::collections::HashMap;

use openparlay_types::{OpenparlayError, Result, Token};
use rust_decimal::Decimal;

/// Tracks per-token inflow/outflow totals and validates conservation.
#[derive(Debug, Default)]
pub struct Conservation {
    /// Total inflows per token since genesis.
    inflows: HashMap<Token, Decimal>,
    /// Total outflows per token since genesis.
    outflows: HashMap<Token, Decimal>,
}

impl Conservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record value entering the vault (deposit or conversion output).
    pub fn record_inflow(&mut self, token: &str, amount: Decimal) {
        *self
            .inflows
            .entry(token.to_string())
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Record value leaving the vault (withdrawal or conversion input).
    pub fn record_outflow(&mut self, token: &str, amount: Decimal) {
        *self
            .outflows
            .entry(token.to_string())
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Expected total held for a token: inflows − outflows.
    #[must_use]
    pub fn expected_supply(&self, token: &str) -> Decimal {
        let inflow = self.inflows.get(token).copied().unwrap_or(Decimal::ZERO);
        let outflow = self.outflows.get(token).copied().unwrap_or(Decimal::ZERO);
        inflow - outflow
    }

    /// Verify the actual held total against the expected supply.
    ///
    /// # Errors
    /// Returns [`OpenparlayError::ConservationViolation`] if actual ≠ expected.
    pub fn verify(&self, token: &str, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply(token);
        if actual_supply != expected {
            return Err(OpenparlayError::ConservationViolation {
                reason: format!(
                    "Token {token}: actual supply {actual_supply} != expected {expected} \
                     (inflows={}, outflows={})",
                    self.inflows.get(token).copied().unwrap_or(Decimal::ZERO),
                    self.outflows.get(token).copied().unwrap_or(Decimal::ZERO),
                ),
            });
        }
        Ok(())
    }

    /// All tokens that have ever flowed through the vault.
    #[must_use]
    pub fn tracked_tokens(&self) -> Vec<Token> {
        let mut tokens: std::collections::HashSet<Token> = self.inflows.keys().cloned().collect();
        tokens.extend(self.outflows.keys().cloned());
        tokens.into_iter().collect()
    }
}
