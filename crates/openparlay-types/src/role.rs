//! Capability roles gating every mutating operation.
//!
//! Exactly one role guards each entry point. Role storage and the check
//! itself live behind the `AccessGate` trait in `openparlay-escrow`; this
//! module only defines the role vocabulary so the leaf crate can name
//! roles in error values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three capability roles of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Token/adapter configuration, role grants, emergency recovery sweeps.
    Administrator,
    /// Opens/closes epochs and drives the settlement pipeline phases.
    EpochController,
    /// Declares matches and records deposits/resolutions on behalf of players.
    MatchSource,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Administrator => write!(f, "ADMINISTRATOR"),
            Self::EpochController => write!(f, "EPOCH_CONTROLLER"),
            Self::MatchSource => write!(f, "MATCH_SOURCE"),
        }
    }
}
