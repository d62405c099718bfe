//! Settlement progress — the resumable cursor of the pipeline.
//!
//! One [`SettlementProgress`] exists per epoch, created by the pipeline's
//! `initialize` phase. Every field only ever advances toward completion;
//! nothing here regresses, which is what makes arbitrary batch sizes and
//! interleaved invocations safe.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Token;

/// Resumable settlement state for one epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementProgress {
    /// The token everything is converted into. Fixed at initialization.
    pub settlement_token: Token,
    /// How many of the epoch's matches have been examined (monotonic cursor,
    /// bounded by the epoch's match count).
    pub processed_matches: usize,
    /// Participants appended to the payout list so far.
    pub participant_count: usize,
    /// Sum of settlement-token-denominated wager weight.
    pub total_weight: Decimal,
    /// Whether the pool-conversion phase has run.
    pub converted: bool,
    /// Settlement-token balance accumulated by conversion.
    pub pool_balance: Decimal,
    /// Running sum of payouts already transferred (backs the
    /// exact-remainder rule for the final participant).
    pub paid_out: Decimal,
    /// Whether every participant has been paid.
    pub fully_paid: bool,
}

impl SettlementProgress {
    #[must_use]
    pub fn new(settlement_token: impl Into<Token>) -> Self {
        Self {
            settlement_token: settlement_token.into(),
            processed_matches: 0,
            participant_count: 0,
            total_weight: Decimal::ZERO,
            converted: false,
            pool_balance: Decimal::ZERO,
            paid_out: Decimal::ZERO,
            fully_paid: false,
        }
    }

    /// Remaining undistributed pool balance.
    #[must_use]
    pub fn unpaid_balance(&self) -> Decimal {
        self.pool_balance - self.paid_out
    }
}
