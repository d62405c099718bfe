//! Token identifiers and unordered token pairs.
//!
//! Tokens are fungible and identified by symbol. Amounts are tracked in
//! whole base units as [`rust_decimal::Decimal`] values; division results
//! are floored so no payout ever exceeds what exact integer arithmetic
//! would allow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type alias for token identifiers (e.g., "PLAY", "USDT", "MEME").
pub type Token = String;

/// An unordered pair of distinct tokens.
///
/// Normalized on construction so `(A, B)` and `(B, A)` are the same key.
/// Used to index the adapter registry and exchange pools: routing between
/// two tokens is direction-agnostic at the lookup level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenPair {
    /// Lexicographically smaller token of the pair.
    lo: Token,
    /// Lexicographically larger token of the pair.
    hi: Token,
}

impl TokenPair {
    /// Build a normalized pair. Returns `None` if both tokens are equal —
    /// a pair of a token with itself is never a valid route.
    #[must_use]
    pub fn new(a: impl Into<Token>, b: impl Into<Token>) -> Option<Self> {
        let a = a.into();
        let b = b.into();
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { lo: a, hi: b }),
            std::cmp::Ordering::Greater => Some(Self { lo: b, hi: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The lexicographically smaller token (canonical "token0").
    #[must_use]
    pub fn lo(&self) -> &Token {
        &self.lo
    }

    /// The lexicographically larger token (canonical "token1").
    #[must_use]
    pub fn hi(&self) -> &Token {
        &self.hi
    }

    /// Whether `token` is one of the two sides.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.lo == token || self.hi == token
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.lo, self.hi)
    }
}
