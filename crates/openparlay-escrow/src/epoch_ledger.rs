//! Epoch ledger — epoch lifecycle and pooled deposit totals.
//!
//! Epoch ids are allocated monotonically and never reused. The eligible
//! token set is snapshotted (deduplicated, order-preserving) at `open`.
//! Deposit totals grow only while the epoch is OPEN and are consumed
//! read-only by the settlement pipeline.

use std::collections::HashMap;

use chrono::Utc;
use openparlay_types::{
    Epoch, EpochId, EpochState, MatchId, OpenparlayError, Result, Token,
};
use rust_decimal::Decimal;

/// Stateful store of epochs and their per-token pooled deposits.
#[derive(Debug, Default)]
pub struct EpochLedger {
    epochs: HashMap<EpochId, Epoch>,
    deposits: HashMap<(EpochId, Token), Decimal>,
    next_id: u64,
}

impl EpochLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new epoch over the given eligible tokens.
    ///
    /// # Errors
    /// Returns `EmptyTokenSet` if no tokens are given.
    pub fn open(&mut self, eligible_tokens: &[Token]) -> Result<EpochId> {
        let mut snapshot: Vec<Token> = Vec::with_capacity(eligible_tokens.len());
        for token in eligible_tokens {
            if !snapshot.contains(token) {
                snapshot.push(token.clone());
            }
        }
        if snapshot.is_empty() {
            return Err(OpenparlayError::EmptyTokenSet);
        }

        let id = EpochId(self.next_id);
        self.next_id += 1;
        tracing::info!(epoch = %id, tokens = snapshot.len(), "Epoch opened");
        self.epochs.insert(id, Epoch::new(id, snapshot));
        Ok(id)
    }

    /// Close an OPEN epoch. Irreversible.
    pub fn close(&mut self, epoch_id: EpochId) -> Result<()> {
        let epoch = self.epoch_mut(epoch_id)?;
        epoch.ensure_state(EpochState::Open)?;
        epoch.state = EpochState::Closed;
        epoch.closed_at = Some(Utc::now());
        tracing::info!(epoch = %epoch_id, "Epoch closed");
        Ok(())
    }

    /// Accumulate a resolved match's pooled share into the epoch fund.
    ///
    /// # Errors
    /// Requires the epoch OPEN and the token in its eligible snapshot.
    pub fn record_deposit(
        &mut self,
        epoch_id: EpochId,
        match_id: MatchId,
        token: &str,
        amount: Decimal,
    ) -> Result<()> {
        let epoch = self.epoch(epoch_id)?;
        epoch.ensure_state(EpochState::Open)?;
        if !epoch.is_eligible(token) {
            return Err(OpenparlayError::TokenNotEligible {
                epoch_id,
                token: token.to_string(),
            });
        }
        if amount.is_zero() {
            return Ok(());
        }
        if amount < Decimal::ZERO {
            return Err(OpenparlayError::NonPositiveAmount(amount));
        }

        *self
            .deposits
            .entry((epoch_id, token.to_string()))
            .or_insert(Decimal::ZERO) += amount;
        tracing::debug!(
            epoch = %epoch_id,
            %match_id,
            token,
            %amount,
            "Pooled deposit recorded"
        );
        Ok(())
    }

    /// Designate the settlement token. CLOSED-only, set-once.
    pub fn set_settlement_token(&mut self, epoch_id: EpochId, token: &str) -> Result<()> {
        let epoch = self.epoch_mut(epoch_id)?;
        epoch.ensure_state(EpochState::Closed)?;
        if epoch.settlement_token.is_some() {
            return Err(OpenparlayError::SettlementAlreadyInitialized(epoch_id));
        }
        if !epoch.is_eligible(token) {
            return Err(OpenparlayError::TokenNotEligible {
                epoch_id,
                token: token.to_string(),
            });
        }
        epoch.settlement_token = Some(token.to_string());
        Ok(())
    }

    /// Transition CLOSED → SETTLED once every payout has been made.
    pub fn mark_settled(&mut self, epoch_id: EpochId) -> Result<()> {
        let epoch = self.epoch_mut(epoch_id)?;
        epoch.ensure_state(EpochState::Closed)?;
        epoch.state = EpochState::Settled;
        epoch.settled_at = Some(Utc::now());
        tracing::info!(epoch = %epoch_id, "Epoch settled");
        Ok(())
    }

    /// Look up an epoch.
    pub fn epoch(&self, epoch_id: EpochId) -> Result<&Epoch> {
        self.epochs
            .get(&epoch_id)
            .ok_or(OpenparlayError::EpochNotFound(epoch_id))
    }

    /// Pooled deposit total for one (epoch, token).
    #[must_use]
    pub fn deposits(&self, epoch_id: EpochId, token: &str) -> Decimal {
        self.deposits
            .get(&(epoch_id, token.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Number of epochs ever opened.
    #[must_use]
    pub fn epoch_count(&self) -> usize {
        self.epochs.len()
    }

    fn epoch_mut(&mut self, epoch_id: EpochId) -> Result<&mut Epoch> {
        self.epochs
            .get_mut(&epoch_id)
            .ok_or(OpenparlayError::EpochNotFound(epoch_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn tokens(names: &[&str]) -> Vec<Token> {
        names.iter().map(|&n| n.to_string()).collect()
    }

    #[test]
    fn open_allocates_monotonic_ids() {
        let mut ledger = EpochLedger::new();
        let first = ledger.open(&tokens(&["PLAY", "USDT"])).unwrap();
        let second = ledger.open(&tokens(&["MEME"])).unwrap();
        assert_eq!(first, EpochId(0));
        assert_eq!(second, EpochId(1));
        assert_eq!(ledger.epoch_count(), 2);
    }

    #[test]
    fn open_deduplicates_snapshot() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY", "USDT", "PLAY"])).unwrap();
        assert_eq!(
            ledger.epoch(id).unwrap().eligible_tokens,
            tokens(&["PLAY", "USDT"])
        );
    }

    #[test]
    fn open_rejects_empty_set() {
        let mut ledger = EpochLedger::new();
        let err = ledger.open(&[]).unwrap_err();
        assert!(matches!(err, OpenparlayError::EmptyTokenSet));
    }

    #[test]
    fn close_is_irreversible() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY"])).unwrap();
        ledger.close(id).unwrap();
        assert_eq!(ledger.epoch(id).unwrap().state, EpochState::Closed);
        let err = ledger.close(id).unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongEpochState { .. }));
    }

    #[test]
    fn deposits_accumulate_while_open() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY", "USDT"])).unwrap();
        ledger
            .record_deposit(id, MatchId::new(), "PLAY", dec(133))
            .unwrap();
        ledger
            .record_deposit(id, MatchId::new(), "PLAY", dec(67))
            .unwrap();
        assert_eq!(ledger.deposits(id, "PLAY"), dec(200));
        assert_eq!(ledger.deposits(id, "USDT"), Decimal::ZERO);
    }

    #[test]
    fn deposit_requires_open_epoch() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY"])).unwrap();
        ledger.close(id).unwrap();
        let err = ledger
            .record_deposit(id, MatchId::new(), "PLAY", dec(10))
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongEpochState { .. }));
    }

    #[test]
    fn deposit_requires_eligible_token() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY"])).unwrap();
        let err = ledger
            .record_deposit(id, MatchId::new(), "MEME", dec(10))
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::TokenNotEligible { .. }));
    }

    #[test]
    fn settlement_token_is_set_once_when_closed() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY", "USDT"])).unwrap();

        // Not while open.
        let err = ledger.set_settlement_token(id, "PLAY").unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongEpochState { .. }));

        ledger.close(id).unwrap();
        ledger.set_settlement_token(id, "PLAY").unwrap();
        assert_eq!(
            ledger.epoch(id).unwrap().settlement_token.as_deref(),
            Some("PLAY")
        );

        let err = ledger.set_settlement_token(id, "USDT").unwrap_err();
        assert!(matches!(
            err,
            OpenparlayError::SettlementAlreadyInitialized(_)
        ));
    }

    #[test]
    fn settlement_token_must_be_eligible() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY"])).unwrap();
        ledger.close(id).unwrap();
        let err = ledger.set_settlement_token(id, "MEME").unwrap_err();
        assert!(matches!(err, OpenparlayError::TokenNotEligible { .. }));
    }

    #[test]
    fn settle_requires_closed() {
        let mut ledger = EpochLedger::new();
        let id = ledger.open(&tokens(&["PLAY"])).unwrap();
        let err = ledger.mark_settled(id).unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongEpochState { .. }));

        ledger.close(id).unwrap();
        ledger.mark_settled(id).unwrap();
        assert_eq!(ledger.epoch(id).unwrap().state, EpochState::Settled);

        // Settled is terminal.
        let err = ledger.mark_settled(id).unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongEpochState { .. }));
    }

    #[test]
    fn unknown_epoch_errors() {
        let ledger = EpochLedger::new();
        let err = ledger.epoch(EpochId(42)).unwrap_err();
        assert!(matches!(err, OpenparlayError::EpochNotFound(_)));
    }
}
