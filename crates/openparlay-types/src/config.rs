//! Engine configuration: the fixed split policy for resolved matches.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OpenparlayError, Result, constants};

/// Policy constants for the three-way split of a resolved match's
/// converted amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Winner's share in basis points (atop their returned stake).
    pub winner_share_bps: u32,
    /// Protocol treasury's share in basis points.
    pub protocol_fee_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            winner_share_bps: constants::WINNER_SHARE_BPS,
            protocol_fee_bps: constants::PROTOCOL_FEE_BPS,
        }
    }
}

/// The exact three-way division of one converted amount.
///
/// `winner_share + protocol_fee + pool_share` always equals the input:
/// both shares are floored and the integer remainder lands in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProceedsSplit {
    pub winner_share: Decimal,
    pub protocol_fee: Decimal,
    pub pool_share: Decimal,
}

impl EngineConfig {
    /// Validate that the two fixed shares fit within the denominator.
    pub fn validate(&self) -> Result<()> {
        let total = self.winner_share_bps + self.protocol_fee_bps;
        if total > constants::BPS_DENOMINATOR {
            return Err(OpenparlayError::Configuration(format!(
                "share split exceeds denominator: {} + {} > {}",
                self.winner_share_bps,
                self.protocol_fee_bps,
                constants::BPS_DENOMINATOR,
            )));
        }
        Ok(())
    }

    /// Split a converted amount three ways, dust-free.
    #[must_use]
    pub fn split(&self, converted: Decimal) -> ProceedsSplit {
        let winner_share = bps_share(converted, self.winner_share_bps);
        let protocol_fee = bps_share(converted, self.protocol_fee_bps);
        ProceedsSplit {
            winner_share,
            protocol_fee,
            pool_share: converted - winner_share - protocol_fee,
        }
    }
}

/// `floor(amount × bps / 10_000)`.
#[must_use]
pub fn bps_share(amount: Decimal, bps: u32) -> Decimal {
    (amount * Decimal::from(bps) / Decimal::from(constants::BPS_DENOMINATOR)).floor()
}
