//! Wager match model.
//!
//! A [`WagerMatch`] pairs two players who stake amounts of two (usually
//! different) tokens inside one epoch. The lifecycle is
//! **PENDING → DEPOSITED_ONE → ACTIVE → {RESOLVED | REFUNDED}**:
//! created on declaration, mutated by the two deposits and exactly one of
//! resolution or refund, and retained immutable thereafter as the
//! settlement record the epoch pipeline reads.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, EpochId, MatchId, Token};

/// Lifecycle status of a wager match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Declared; neither stake deposited yet.
    Pending,
    /// Exactly one stake deposited.
    DepositedOne,
    /// Both stakes in escrow; resolvable.
    Active,
    /// Winner recorded, stakes converted and split. Terminal.
    Resolved,
    /// Deposited stakes returned. Terminal.
    Refunded,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::DepositedOne => write!(f, "DEPOSITED_ONE"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Resolved => write!(f, "RESOLVED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

impl MatchStatus {
    /// Whether the match can still change (deposit, resolve, refund).
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::DepositedOne | Self::Active)
    }
}

/// One side of a wager: a player staking an amount of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLeg {
    pub player: AccountId,
    pub token: Token,
    pub amount: Decimal,
    /// Whether this side's stake has been moved into escrow.
    pub deposited: bool,
}

impl MatchLeg {
    #[must_use]
    pub fn new(player: AccountId, token: impl Into<Token>, amount: Decimal) -> Self {
        Self {
            player,
            token: token.into(),
            amount,
            deposited: false,
        }
    }
}

/// A paired wager between two players, owned by one epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerMatch {
    pub id: MatchId,
    pub legs: [MatchLeg; 2],
    pub status: MatchStatus,
    /// Set exactly once, by resolution.
    pub winner: Option<AccountId>,
    pub epoch_id: EpochId,
    pub declared_at: DateTime<Utc>,
    /// When the match reached a terminal status.
    pub settled_at: Option<DateTime<Utc>>,
}

impl WagerMatch {
    #[must_use]
    pub fn new(id: MatchId, legs: [MatchLeg; 2], epoch_id: EpochId) -> Self {
        Self {
            id,
            legs,
            status: MatchStatus::Pending,
            winner: None,
            epoch_id,
            declared_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Whether `account` is one of the two players.
    #[must_use]
    pub fn is_participant(&self, account: AccountId) -> bool {
        self.legs.iter().any(|leg| leg.player == account)
    }

    /// The leg staked by `account`, if they are a participant.
    #[must_use]
    pub fn leg_of(&self, account: AccountId) -> Option<&MatchLeg> {
        self.legs.iter().find(|leg| leg.player == account)
    }

    /// The leg staked by the opponent of `account`.
    #[must_use]
    pub fn opponent_of(&self, account: AccountId) -> Option<&MatchLeg> {
        if !self.is_participant(account) {
            return None;
        }
        self.legs.iter().find(|leg| leg.player != account)
    }

    /// Number of legs whose stake is already in escrow.
    #[must_use]
    pub fn deposited_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.deposited).count()
    }

    /// The winner's leg, once resolved.
    #[must_use]
    pub fn winning_leg(&self) -> Option<&MatchLeg> {
        self.winner.and_then(|w| self.leg_of(w))
    }
}
