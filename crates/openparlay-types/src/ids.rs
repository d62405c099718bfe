//! Globally unique identifiers used throughout OpenParlay.
//!
//! Entity IDs use UUIDv7 for time-ordered lexicographic sorting, except
//! `EpochId` which is a plain monotonic counter allocated by the epoch
//! ledger and never reused.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Globally unique wager-match identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Deterministic `MatchId` from an epoch and a declaration sequence.
    ///
    /// A match source that declares the same (epoch, sequence) pair twice
    /// produces the same ID, so accidental re-declaration is caught by the
    /// duplicate-ID check instead of silently creating a second match.
    #[must_use]
    pub fn deterministic(epoch_id: u64, sequence: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"openparlay:match_id:v2:");
        hasher.update(epoch_id.to_le_bytes());
        hasher.update(sequence.to_le_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Unique identifier for a player or protocol account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EpochId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for a settlement epoch.
///
/// Allocated by the epoch ledger on `open`, never reused. Each epoch runs
/// OPEN → CLOSED → SETTLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EpochId(pub u64);

impl EpochId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_id_uniqueness() {
        let a = MatchId::new();
        let b = MatchId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn match_id_ordering() {
        let a = MatchId::new();
        let b = MatchId::new();
        assert!(a < b);
    }

    #[test]
    fn match_id_deterministic() {
        let a = MatchId::deterministic(7, 0);
        let b = MatchId::deterministic(7, 0);
        assert_eq!(a, b);
        let c = MatchId::deterministic(7, 1);
        assert_ne!(a, c);
    }

    #[test]
    fn account_id_uniqueness() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn epoch_id_next() {
        assert_eq!(EpochId(0).next(), EpochId(1));
        assert_eq!(EpochId(99).next(), EpochId(100));
    }

    #[test]
    fn epoch_id_display() {
        assert_eq!(format!("{}", EpochId(3)), "epoch:3");
    }

    #[test]
    fn serde_roundtrips() {
        let mid = MatchId::new();
        let json = serde_json::to_string(&mid).unwrap();
        let back: MatchId = serde_json::from_str(&json).unwrap();
        assert_eq!(mid, back);

        let aid = AccountId::new();
        let json = serde_json::to_string(&aid).unwrap();
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(aid, back);
    }
}
