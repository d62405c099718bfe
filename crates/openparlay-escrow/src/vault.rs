//! Holder-keyed vault — the source of truth for all funds.
//!
//! Every unit of value the system custodies is attributed to exactly one
//! [`Holder`]: a player's free balance, a match's escrow, an epoch's
//! pooled fund, the protocol treasury, or the failed-conversion pool.
//! Funds enter via external deposit, move between holders via conserving
//! transfers, change denomination via conversion, and leave via external
//! withdrawal. A [`Conservation`] tracker audits the totals.

use std::collections::HashMap;

use openparlay_types::{AccountId, EpochId, MatchId, OpenparlayError, Result, Token};
use rust_decimal::Decimal;

use crate::conservation::Conservation;

/// Who a vault balance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Holder {
    /// A player's freely usable balance.
    Player(AccountId),
    /// Stakes locked by an unresolved match.
    MatchEscrow(MatchId),
    /// An epoch's pooled fund.
    EpochPool(EpochId),
    /// Protocol fee revenue.
    Treasury,
    /// Amounts a pool conversion could not place, awaiting recovery sweep.
    FailedPool,
}

impl std::fmt::Display for Holder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player:{id}"),
            Self::MatchEscrow(id) => write!(f, "escrow:{id}"),
            Self::EpochPool(id) => write!(f, "pool:{id}"),
            Self::Treasury => write!(f, "treasury"),
            Self::FailedPool => write!(f, "failed-pool"),
        }
    }
}

/// Holder-keyed balance store with conservation auditing.
#[derive(Debug, Default)]
pub struct Vault {
    holdings: HashMap<(Holder, Token), Decimal>,
    conservation: Conservation,
}

impl Vault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of one (holder, token) cell.
    #[must_use]
    pub fn balance(&self, holder: Holder, token: &str) -> Decimal {
        self.holdings
            .get(&(holder, token.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Total held of a token across all holders.
    #[must_use]
    pub fn held_total(&self, token: &str) -> Decimal {
        self.holdings
            .iter()
            .filter(|((_, t), _)| t == token)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// External deposit: value enters the system under `holder`.
    ///
    /// # Errors
    /// Rejects non-positive amounts.
    pub fn deposit_external(&mut self, holder: Holder, token: &str, amount: Decimal) -> Result<()> {
        Self::ensure_positive(amount)?;
        *self
            .holdings
            .entry((holder, token.to_string()))
            .or_insert(Decimal::ZERO) += amount;
        self.conservation.record_inflow(token, amount);
        Ok(())
    }

    /// External withdrawal: value leaves the system from `holder`.
    ///
    /// # Errors
    /// Rejects non-positive amounts and balances too small to cover.
    pub fn withdraw_external(&mut self, holder: Holder, token: &str, amount: Decimal) -> Result<()> {
        Self::ensure_positive(amount)?;
        self.debit(holder, token, amount)?;
        self.conservation.record_outflow(token, amount);
        Ok(())
    }

    /// Internal transfer between holders. Zero amounts are a no-op.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if `from` cannot cover `amount`.
    pub fn transfer(&mut self, from: Holder, to: Holder, token: &str, amount: Decimal) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        Self::ensure_positive(amount)?;
        self.debit(from, token, amount)?;
        *self
            .holdings
            .entry((to, token.to_string()))
            .or_insert(Decimal::ZERO) += amount;
        Ok(())
    }

    /// Re-denominate a holding after a conversion: `amount_in` of
    /// `from_token` left for the exchange, `amount_out` of `to_token`
    /// came back to the same holder.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if the holder cannot cover `amount_in`.
    pub fn convert_holding(
        &mut self,
        holder: Holder,
        from_token: &str,
        amount_in: Decimal,
        to_token: &str,
        amount_out: Decimal,
    ) -> Result<()> {
        Self::ensure_positive(amount_in)?;
        self.debit(holder, from_token, amount_in)?;
        self.conservation.record_outflow(from_token, amount_in);
        *self
            .holdings
            .entry((holder, to_token.to_string()))
            .or_insert(Decimal::ZERO) += amount_out;
        self.conservation.record_inflow(to_token, amount_out);
        Ok(())
    }

    /// Verify the conservation invariant for one token.
    pub fn verify_conservation(&self, token: &str) -> Result<()> {
        self.conservation.verify(token, self.held_total(token))
    }

    /// Verify the conservation invariant for every tracked token.
    pub fn verify_all(&self) -> Result<()> {
        for token in self.conservation.tracked_tokens() {
            self.verify_conservation(&token)?;
        }
        Ok(())
    }

    fn debit(&mut self, holder: Holder, token: &str, amount: Decimal) -> Result<()> {
        let available = self.balance(holder, token);
        if available < amount {
            return Err(OpenparlayError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        *self
            .holdings
            .get_mut(&(holder, token.to_string()))
            .expect("balance checked above") -= amount;
        Ok(())
    }

    fn ensure_positive(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(OpenparlayError::NonPositiveAmount(amount));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn deposit_and_balance() {
        let mut vault = Vault::new();
        let alice = Holder::Player(AccountId::new());
        vault.deposit_external(alice, "USDT", dec(1_000)).unwrap();
        assert_eq!(vault.balance(alice, "USDT"), dec(1_000));
        assert_eq!(vault.held_total("USDT"), dec(1_000));
        vault.verify_conservation("USDT").unwrap();
    }

    #[test]
    fn transfer_conserves_total() {
        let mut vault = Vault::new();
        let alice = Holder::Player(AccountId::new());
        let escrow = Holder::MatchEscrow(MatchId::new());
        vault.deposit_external(alice, "MEME", dec(500)).unwrap();
        vault.transfer(alice, escrow, "MEME", dec(133)).unwrap();

        assert_eq!(vault.balance(alice, "MEME"), dec(367));
        assert_eq!(vault.balance(escrow, "MEME"), dec(133));
        assert_eq!(vault.held_total("MEME"), dec(500));
        vault.verify_conservation("MEME").unwrap();
    }

    #[test]
    fn transfer_insufficient_fails_cleanly() {
        let mut vault = Vault::new();
        let alice = Holder::Player(AccountId::new());
        vault.deposit_external(alice, "MEME", dec(100)).unwrap();
        let err = vault
            .transfer(alice, Holder::Treasury, "MEME", dec(200))
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::InsufficientFunds { .. }));
        assert_eq!(vault.balance(alice, "MEME"), dec(100));
    }

    #[test]
    fn zero_transfer_is_noop() {
        let mut vault = Vault::new();
        let alice = Holder::Player(AccountId::new());
        vault
            .transfer(alice, Holder::Treasury, "MEME", Decimal::ZERO)
            .unwrap();
        assert_eq!(vault.balance(Holder::Treasury, "MEME"), Decimal::ZERO);
    }

    #[test]
    fn convert_holding_redenominates() {
        let mut vault = Vault::new();
        let pool = Holder::EpochPool(EpochId(1));
        vault.deposit_external(pool, "MEME", dec(500)).unwrap();
        vault
            .convert_holding(pool, "MEME", dec(500), "USDT", dec(495))
            .unwrap();

        assert_eq!(vault.balance(pool, "MEME"), Decimal::ZERO);
        assert_eq!(vault.balance(pool, "USDT"), dec(495));
        vault.verify_all().unwrap();
    }

    #[test]
    fn withdraw_external_burns() {
        let mut vault = Vault::new();
        vault
            .deposit_external(Holder::Treasury, "USDT", dec(50))
            .unwrap();
        vault
            .withdraw_external(Holder::Treasury, "USDT", dec(20))
            .unwrap();
        assert_eq!(vault.held_total("USDT"), dec(30));
        vault.verify_conservation("USDT").unwrap();
    }

    #[test]
    fn nonpositive_amounts_rejected() {
        let mut vault = Vault::new();
        let alice = Holder::Player(AccountId::new());
        let err = vault
            .deposit_external(alice, "USDT", Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::NonPositiveAmount(_)));
        let err = vault
            .deposit_external(alice, "USDT", dec(-5))
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::NonPositiveAmount(_)));
    }

    #[test]
    fn holder_display() {
        assert_eq!(format!("{}", Holder::Treasury), "treasury");
        assert_eq!(format!("{}", Holder::FailedPool), "failed-pool");
        assert!(format!("{}", Holder::EpochPool(EpochId(2))).starts_with("pool:epoch:2"));
    }
}
