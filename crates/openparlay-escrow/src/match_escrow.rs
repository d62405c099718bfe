//! Match escrow — the per-match escrow-swap-split state machine.
//!
//! Lifecycle: **PENDING → DEPOSITED_ONE → ACTIVE → {RESOLVED | REFUNDED}**.
//! Declaration validates the wager against the owning epoch's token
//! snapshot; deposits move player funds into the match's escrow holding;
//! resolution converts the loser's stake into the winner's token and
//! splits it three ways; refund returns whatever was deposited.
//!
//! Resolution is all-or-nothing: a conversion failure fails the whole
//! operation with no balance change anywhere, unlike the fault-tolerant
//! epoch pool conversion. All fallible steps run before the first vault
//! mutation, and the vault steps that follow can only fail on a broken
//! escrow invariant.
//!
//! Resolved matches are immutable settlement records; the per-epoch
//! declare-order index gives the settlement pipeline its deterministic,
//! resumable iteration order.

use std::collections::HashMap;

use chrono::Utc;
use openparlay_types::{
    AccountId, EngineConfig, EpochId, EpochState, MatchId, MatchLeg, MatchStatus,
    OpenparlayError, ProceedsSplit, Result, RoutingHint, WagerMatch,
};
use openparlay_swap::AdapterRegistry;
use rust_decimal::Decimal;

use crate::epoch_ledger::EpochLedger;
use crate::vault::{Holder, Vault};

/// Stateful store of wager matches, indexed by epoch in declare order.
#[derive(Debug, Default)]
pub struct MatchBook {
    matches: HashMap<MatchId, WagerMatch>,
    epoch_index: HashMap<EpochId, Vec<MatchId>>,
}

impl MatchBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new PENDING match inside an OPEN epoch.
    ///
    /// # Errors
    /// Rejects duplicate ids, non-OPEN epochs, tokens outside the epoch
    /// snapshot, zero/negative stakes, one player on both legs, and both
    /// legs staking the same token.
    pub fn declare(
        &mut self,
        ledger: &EpochLedger,
        match_id: MatchId,
        mut legs: [MatchLeg; 2],
        epoch_id: EpochId,
    ) -> Result<()> {
        if self.matches.contains_key(&match_id) {
            return Err(OpenparlayError::DuplicateMatch(match_id));
        }
        let epoch = ledger.epoch(epoch_id)?;
        epoch.ensure_state(EpochState::Open)?;

        if legs[0].player == legs[1].player {
            return Err(OpenparlayError::InvalidWager {
                reason: "both legs staked by the same player".into(),
            });
        }
        if legs[0].token == legs[1].token {
            return Err(OpenparlayError::InvalidWager {
                reason: format!("both legs stake {}", legs[0].token),
            });
        }
        for leg in &legs {
            if leg.amount <= Decimal::ZERO {
                return Err(OpenparlayError::InvalidWager {
                    reason: format!("zero wager for {}", leg.player),
                });
            }
            if !epoch.is_eligible(&leg.token) {
                return Err(OpenparlayError::TokenNotEligible {
                    epoch_id,
                    token: leg.token.clone(),
                });
            }
        }

        for leg in &mut legs {
            leg.deposited = false;
        }
        self.matches
            .insert(match_id, WagerMatch::new(match_id, legs, epoch_id));
        self.epoch_index.entry(epoch_id).or_default().push(match_id);
        tracing::debug!(%match_id, epoch = %epoch_id, "Match declared");
        Ok(())
    }

    /// Move `player`'s stake from their vault balance into match escrow.
    ///
    /// Either leg may deposit first: PENDING → DEPOSITED_ONE → ACTIVE.
    pub fn deposit_stake(
        &mut self,
        vault: &mut Vault,
        match_id: MatchId,
        player: AccountId,
    ) -> Result<()> {
        let m = self.get(match_id)?;
        if !matches!(m.status, MatchStatus::Pending | MatchStatus::DepositedOne) {
            return Err(OpenparlayError::WrongMatchStatus {
                expected: MatchStatus::Pending,
                actual: m.status,
            });
        }
        let leg = m
            .leg_of(player)
            .ok_or(OpenparlayError::NotAParticipant { match_id, account: player })?;
        if leg.deposited {
            return Err(OpenparlayError::StakeAlreadyDeposited {
                match_id,
                account: player,
            });
        }
        let (token, amount) = (leg.token.clone(), leg.amount);

        vault.transfer(
            Holder::Player(player),
            Holder::MatchEscrow(match_id),
            &token,
            amount,
        )?;

        let m = self
            .matches
            .get_mut(&match_id)
            .expect("existence checked above");
        for leg in &mut m.legs {
            if leg.player == player {
                leg.deposited = true;
            }
        }
        m.status = match m.deposited_count() {
            1 => MatchStatus::DepositedOne,
            _ => MatchStatus::Active,
        };
        tracing::debug!(%match_id, %player, %token, %amount, status = %m.status, "Stake deposited");
        Ok(())
    }

    /// Resolve an ACTIVE match in favor of `winner`.
    ///
    /// Converts the loser's stake into the winner's token (fatal on
    /// failure), then splits: the winner's share atop their returned
    /// stake, the protocol fee to the treasury, and the exact remainder
    /// into the owning epoch's pooled fund.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &mut self,
        vault: &mut Vault,
        registry: &mut AdapterRegistry,
        ledger: &mut EpochLedger,
        config: &EngineConfig,
        match_id: MatchId,
        winner: AccountId,
        hint: &RoutingHint,
    ) -> Result<ProceedsSplit> {
        let m = self.get(match_id)?;
        if m.status != MatchStatus::Active {
            return Err(OpenparlayError::WrongMatchStatus {
                expected: MatchStatus::Active,
                actual: m.status,
            });
        }
        let winner_leg = m
            .leg_of(winner)
            .ok_or(OpenparlayError::NotAParticipant { match_id, account: winner })?
            .clone();
        let loser_leg = m
            .opponent_of(winner)
            .expect("two-leg match always has an opponent")
            .clone();
        let epoch_id = m.epoch_id;

        // The pooled share lands in EpochDeposits, so the epoch must still
        // accept deposits before any conversion runs.
        ledger.epoch(epoch_id)?.ensure_state(EpochState::Open)?;

        // Price protection is delegated to the adapter layer: min_out zero.
        let adapter = registry.route(&loser_leg.token, &winner_leg.token)?;
        let converted = adapter.convert(
            &loser_leg.token,
            &winner_leg.token,
            loser_leg.amount,
            Decimal::ZERO,
            hint,
        )?;
        let split = config.split(converted);

        // Conversion committed; the remaining vault moves only touch the
        // escrow holding this book itself funded.
        vault.convert_holding(
            Holder::MatchEscrow(match_id),
            &loser_leg.token,
            loser_leg.amount,
            &winner_leg.token,
            converted,
        )?;
        vault.transfer(
            Holder::MatchEscrow(match_id),
            Holder::Player(winner),
            &winner_leg.token,
            winner_leg.amount + split.winner_share,
        )?;
        vault.transfer(
            Holder::MatchEscrow(match_id),
            Holder::Treasury,
            &winner_leg.token,
            split.protocol_fee,
        )?;
        vault.transfer(
            Holder::MatchEscrow(match_id),
            Holder::EpochPool(epoch_id),
            &winner_leg.token,
            split.pool_share,
        )?;
        ledger.record_deposit(epoch_id, match_id, &winner_leg.token, split.pool_share)?;

        let m = self
            .matches
            .get_mut(&match_id)
            .expect("existence checked above");
        m.winner = Some(winner);
        m.status = MatchStatus::Resolved;
        m.settled_at = Some(Utc::now());

        tracing::info!(
            %match_id,
            epoch = %epoch_id,
            %winner,
            %converted,
            winner_share = %split.winner_share,
            protocol_fee = %split.protocol_fee,
            pool_share = %split.pool_share,
            "Match resolved"
        );
        Ok(split)
    }

    /// Refund whatever was deposited and terminate the match.
    ///
    /// Valid from any live status; a second refund fails on the status
    /// check because the match is no longer active.
    pub fn refund(&mut self, vault: &mut Vault, match_id: MatchId) -> Result<()> {
        let m = self.get(match_id)?;
        if !m.status.is_live() {
            return Err(OpenparlayError::WrongMatchStatus {
                expected: MatchStatus::Active,
                actual: m.status,
            });
        }
        let returns: Vec<(AccountId, String, Decimal)> = m
            .legs
            .iter()
            .filter(|leg| leg.deposited)
            .map(|leg| (leg.player, leg.token.clone(), leg.amount))
            .collect();

        for (player, token, amount) in &returns {
            vault.transfer(
                Holder::MatchEscrow(match_id),
                Holder::Player(*player),
                token,
                *amount,
            )?;
        }

        let m = self
            .matches
            .get_mut(&match_id)
            .expect("existence checked above");
        m.status = MatchStatus::Refunded;
        m.settled_at = Some(Utc::now());
        tracing::info!(%match_id, refunds = returns.len(), "Match refunded");
        Ok(())
    }

    /// Read-only lookup of the (eventually immutable) match record.
    pub fn get(&self, match_id: MatchId) -> Result<&WagerMatch> {
        self.matches
            .get(&match_id)
            .ok_or(OpenparlayError::MatchNotFound(match_id))
    }

    /// Declare-ordered match ids of one epoch.
    #[must_use]
    pub fn matches_in_epoch(&self, epoch_id: EpochId) -> &[MatchId] {
        match self.epoch_index.get(&epoch_id) {
            Some(ids) => ids,
            None => &[],
        }
    }

    /// Number of matches declared inside one epoch.
    #[must_use]
    pub fn count_in_epoch(&self, epoch_id: EpochId) -> usize {
        self.matches_in_epoch(epoch_id).len()
    }

    /// Total matches ever declared.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use openparlay_swap::CpmmAdapter;

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    struct Harness {
        book: MatchBook,
        vault: Vault,
        registry: AdapterRegistry,
        ledger: EpochLedger,
        config: EngineConfig,
        epoch: EpochId,
        alice: AccountId,
        bob: AccountId,
    }

    /// Alice holds USDT, Bob holds MEME; one deep MEME/USDT pool.
    fn harness() -> Harness {
        let mut ledger = EpochLedger::new();
        let epoch = ledger
            .open(&["MEME".to_string(), "USDT".to_string()])
            .unwrap();

        let mut vault = Vault::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        vault
            .deposit_external(Holder::Player(alice), "USDT", dec(1_000))
            .unwrap();
        vault
            .deposit_external(Holder::Player(bob), "MEME", dec(1_000))
            .unwrap();

        let mut registry = AdapterRegistry::new();
        registry
            .set(
                "MEME",
                "USDT",
                Box::new(CpmmAdapter::new().with_pool(
                    "MEME",
                    "USDT",
                    dec(1_000_000),
                    dec(1_000_000),
                    3_000,
                )),
            )
            .unwrap();

        Harness {
            book: MatchBook::new(),
            vault,
            registry,
            ledger,
            config: EngineConfig::default(),
            epoch,
            alice,
            bob,
        }
    }

    fn legs(h: &Harness, usdt: i64, meme: i64) -> [MatchLeg; 2] {
        [
            MatchLeg::new(h.alice, "USDT", dec(usdt)),
            MatchLeg::new(h.bob, "MEME", dec(meme)),
        ]
    }

    fn declared_active(h: &mut Harness, usdt: i64, meme: i64) -> MatchId {
        let id = MatchId::new();
        let legs = legs(h, usdt, meme);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        h.book.deposit_stake(&mut h.vault, id, h.alice).unwrap();
        h.book.deposit_stake(&mut h.vault, id, h.bob).unwrap();
        id
    }

    #[test]
    fn declare_creates_pending() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        let m = h.book.get(id).unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(h.book.count_in_epoch(h.epoch), 1);
    }

    #[test]
    fn declare_rejects_zero_wager() {
        let mut h = harness();
        let legs = legs(&h, 0, 459);
        let err = h
            .book
            .declare(&h.ledger, MatchId::new(), legs, h.epoch)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::InvalidWager { .. }));
        assert!(h.book.is_empty());
    }

    #[test]
    fn declare_rejects_duplicate_id() {
        let mut h = harness();
        let id = MatchId::new();
        let first = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, first, h.epoch).unwrap();
        let second = legs(&h, 10, 10);
        let err = h.book.declare(&h.ledger, id, second, h.epoch).unwrap_err();
        assert!(matches!(err, OpenparlayError::DuplicateMatch(_)));
    }

    #[test]
    fn declare_rejects_ineligible_token() {
        let mut h = harness();
        let legs = [
            MatchLeg::new(h.alice, "GOLD", dec(100)),
            MatchLeg::new(h.bob, "MEME", dec(100)),
        ];
        let err = h
            .book
            .declare(&h.ledger, MatchId::new(), legs, h.epoch)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::TokenNotEligible { .. }));
    }

    #[test]
    fn declare_rejects_same_player_and_same_token() {
        let mut h = harness();
        let same_player = [
            MatchLeg::new(h.alice, "USDT", dec(100)),
            MatchLeg::new(h.alice, "MEME", dec(100)),
        ];
        let err = h
            .book
            .declare(&h.ledger, MatchId::new(), same_player, h.epoch)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::InvalidWager { .. }));

        let same_token = [
            MatchLeg::new(h.alice, "USDT", dec(100)),
            MatchLeg::new(h.bob, "USDT", dec(100)),
        ];
        let err = h
            .book
            .declare(&h.ledger, MatchId::new(), same_token, h.epoch)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::InvalidWager { .. }));
    }

    #[test]
    fn declare_requires_open_epoch() {
        let mut h = harness();
        h.ledger.close(h.epoch).unwrap();
        let legs = legs(&h, 133, 459);
        let err = h
            .book
            .declare(&h.ledger, MatchId::new(), legs, h.epoch)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongEpochState { .. }));
    }

    #[test]
    fn deposits_advance_status_in_either_order() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();

        h.book.deposit_stake(&mut h.vault, id, h.bob).unwrap();
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::DepositedOne);

        h.book.deposit_stake(&mut h.vault, id, h.alice).unwrap();
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::Active);

        assert_eq!(
            h.vault.balance(Holder::MatchEscrow(id), "USDT"),
            dec(133)
        );
        assert_eq!(
            h.vault.balance(Holder::MatchEscrow(id), "MEME"),
            dec(459)
        );
    }

    #[test]
    fn double_deposit_rejected() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        h.book.deposit_stake(&mut h.vault, id, h.alice).unwrap();
        let err = h
            .book
            .deposit_stake(&mut h.vault, id, h.alice)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::StakeAlreadyDeposited { .. }));
    }

    #[test]
    fn deposit_by_outsider_rejected() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        let err = h
            .book
            .deposit_stake(&mut h.vault, id, AccountId::new())
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::NotAParticipant { .. }));
    }

    #[test]
    fn underfunded_deposit_leaves_match_unchanged() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = [
            MatchLeg::new(h.alice, "USDT", dec(5_000)),
            MatchLeg::new(h.bob, "MEME", dec(459)),
        ];
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        let err = h
            .book
            .deposit_stake(&mut h.vault, id, h.alice)
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::InsufficientFunds { .. }));
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::Pending);
        assert_eq!(h.vault.balance(Holder::Player(h.alice), "USDT"), dec(1_000));
    }

    #[test]
    fn resolve_splits_exactly() {
        let mut h = harness();
        let id = declared_active(&mut h, 133, 459);

        let split = h
            .book
            .resolve(
                &mut h.vault,
                &mut h.registry,
                &mut h.ledger,
                &h.config,
                id,
                h.alice,
                &RoutingHint::direct(),
            )
            .unwrap();

        // 459 MEME against a 1M/1M 0.3% pool converts to 457 USDT.
        let converted = split.winner_share + split.protocol_fee + split.pool_share;
        assert_eq!(converted, dec(457));
        assert_eq!(split.winner_share, dec(315)); // floor(457 * 0.69)
        assert_eq!(split.protocol_fee, dec(4)); // floor(457 * 0.01)
        assert_eq!(split.pool_share, dec(138)); // exact remainder

        // Winner got stake back plus share; escrow fully drained.
        assert_eq!(
            h.vault.balance(Holder::Player(h.alice), "USDT"),
            dec(1_000 - 133 + 133 + 315)
        );
        assert_eq!(h.vault.balance(Holder::Treasury, "USDT"), dec(4));
        assert_eq!(
            h.vault.balance(Holder::EpochPool(h.epoch), "USDT"),
            dec(138)
        );
        assert_eq!(
            h.vault.balance(Holder::MatchEscrow(id), "USDT"),
            Decimal::ZERO
        );
        assert_eq!(
            h.vault.balance(Holder::MatchEscrow(id), "MEME"),
            Decimal::ZERO
        );
        assert_eq!(h.ledger.deposits(h.epoch, "USDT"), dec(138));

        let m = h.book.get(id).unwrap();
        assert_eq!(m.status, MatchStatus::Resolved);
        assert_eq!(m.winner, Some(h.alice));
        assert!(m.settled_at.is_some());

        h.vault.verify_all().unwrap();
    }

    #[test]
    fn resolve_requires_active() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        let err = h
            .book
            .resolve(
                &mut h.vault,
                &mut h.registry,
                &mut h.ledger,
                &h.config,
                id,
                h.alice,
                &RoutingHint::direct(),
            )
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongMatchStatus { .. }));
    }

    #[test]
    fn resolve_rejects_non_participant_winner() {
        let mut h = harness();
        let id = declared_active(&mut h, 133, 459);
        let err = h
            .book
            .resolve(
                &mut h.vault,
                &mut h.registry,
                &mut h.ledger,
                &h.config,
                id,
                AccountId::new(),
                &RoutingHint::direct(),
            )
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::NotAParticipant { .. }));
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::Active);
    }

    #[test]
    fn failed_conversion_rolls_back_everything() {
        let mut h = harness();
        let id = declared_active(&mut h, 133, 459);

        // Break the route: a fresh adapter with no pools at all.
        h.registry
            .set("MEME", "USDT", Box::new(CpmmAdapter::new()))
            .unwrap();

        let err = h
            .book
            .resolve(
                &mut h.vault,
                &mut h.registry,
                &mut h.ledger,
                &h.config,
                id,
                h.alice,
                &RoutingHint::direct(),
            )
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::UnknownPool { .. }));

        // No balance changed anywhere; the match is still resolvable.
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::Active);
        assert_eq!(h.vault.balance(Holder::MatchEscrow(id), "USDT"), dec(133));
        assert_eq!(h.vault.balance(Holder::MatchEscrow(id), "MEME"), dec(459));
        assert_eq!(h.vault.balance(Holder::Treasury, "USDT"), Decimal::ZERO);
        assert_eq!(h.ledger.deposits(h.epoch, "USDT"), Decimal::ZERO);
        h.vault.verify_all().unwrap();
    }

    #[test]
    fn missing_adapter_is_a_validation_error() {
        let mut h = harness();
        let id = declared_active(&mut h, 133, 459);
        h.registry.clear("MEME", "USDT");
        let err = h
            .book
            .resolve(
                &mut h.vault,
                &mut h.registry,
                &mut h.ledger,
                &h.config,
                id,
                h.bob,
                &RoutingHint::direct(),
            )
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::AdapterNotConfigured { .. }));
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::Active);
    }

    #[test]
    fn refund_returns_deposited_legs_only() {
        let mut h = harness();
        let id = MatchId::new();
        let legs = legs(&h, 133, 459);
        h.book.declare(&h.ledger, id, legs, h.epoch).unwrap();
        h.book.deposit_stake(&mut h.vault, id, h.alice).unwrap();

        h.book.refund(&mut h.vault, id).unwrap();
        assert_eq!(h.book.get(id).unwrap().status, MatchStatus::Refunded);
        assert_eq!(h.vault.balance(Holder::Player(h.alice), "USDT"), dec(1_000));
        assert_eq!(h.vault.balance(Holder::Player(h.bob), "MEME"), dec(1_000));
        assert_eq!(
            h.vault.balance(Holder::MatchEscrow(id), "USDT"),
            Decimal::ZERO
        );
        h.vault.verify_all().unwrap();
    }

    #[test]
    fn double_refund_fails() {
        let mut h = harness();
        let id = declared_active(&mut h, 133, 459);
        h.book.refund(&mut h.vault, id).unwrap();
        let err = h.book.refund(&mut h.vault, id).unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongMatchStatus { .. }));
    }

    #[test]
    fn resolved_match_cannot_be_refunded() {
        let mut h = harness();
        let id = declared_active(&mut h, 133, 459);
        h.book
            .resolve(
                &mut h.vault,
                &mut h.registry,
                &mut h.ledger,
                &h.config,
                id,
                h.bob,
                &RoutingHint::direct(),
            )
            .unwrap();
        let err = h.book.refund(&mut h.vault, id).unwrap_err();
        assert!(matches!(err, OpenparlayError::WrongMatchStatus { .. }));
    }

    #[test]
    fn epoch_index_preserves_declare_order() {
        let mut h = harness();
        let first = declared_active(&mut h, 10, 20);
        let second = declared_active(&mut h, 30, 40);
        assert_eq!(h.book.matches_in_epoch(h.epoch), &[first, second]);
    }
}
