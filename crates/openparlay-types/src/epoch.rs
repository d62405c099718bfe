//! Epoch lifecycle types.
//!
//! An epoch is a time-boxed accounting window. Its state moves strictly
//! forward: **OPEN → CLOSED → SETTLED**, never backwards. While OPEN,
//! resolved matches feed the pooled fund; once CLOSED, the settlement
//! pipeline converts and distributes the pool; SETTLED is terminal.
//!
//! The eligible-token set is snapshotted at `open` and never mutated, so
//! every deposit and the settlement-token choice are validated against the
//! same frozen universe.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EpochId, OpenparlayError, Result, Token};

/// The three forward-only states of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpochState {
    /// Accepting pooled deposits from resolved matches.
    Open,
    /// No further deposits; awaiting or undergoing settlement.
    Closed,
    /// Pool fully distributed. Terminal.
    Settled,
}

impl fmt::Display for EpochState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// A settlement epoch: identity, frozen token universe, lifecycle state,
/// and the settlement token designated at pipeline initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epoch {
    pub id: EpochId,
    /// Ordered snapshot taken at `open`; never mutated afterwards.
    pub eligible_tokens: Vec<Token>,
    pub state: EpochState,
    /// Set exactly once, during settlement initialization.
    pub settlement_token: Option<Token>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Epoch {
    #[must_use]
    pub fn new(id: EpochId, eligible_tokens: Vec<Token>) -> Self {
        Self {
            id,
            eligible_tokens,
            state: EpochState::Open,
            settlement_token: None,
            opened_at: Utc::now(),
            closed_at: None,
            settled_at: None,
        }
    }

    /// Whether `token` is in the epoch's frozen eligible set.
    #[must_use]
    pub fn is_eligible(&self, token: &str) -> bool {
        self.eligible_tokens.iter().any(|t| t == token)
    }

    /// Guard that the epoch is in `expected` state.
    pub fn ensure_state(&self, expected: EpochState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(OpenparlayError::WrongEpochState {
                expected,
                actual: self.state,
            })
        }
    }
}
