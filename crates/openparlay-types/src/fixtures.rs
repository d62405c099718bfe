//! Test fixture helpers, behind the `test-helpers` feature.
//!
//! Stakes are randomized whole-unit amounts so tests exercise
//! non-divisible weight distributions without hand-picking values.

use rand::Rng;
use rust_decimal::Decimal;

use crate::AccountId;

/// A random whole-unit stake in `[1, 1_000]`.
#[must_use]
pub fn stake() -> Decimal {
    Decimal::from(rand::thread_rng().gen_range(1..=1_000_u64))
}

/// `n` random stakes.
#[must_use]
pub fn stakes(n: usize) -> Vec<Decimal> {
    (0..n).map(|_| stake()).collect()
}

/// `n` fresh accounts.
#[must_use]
pub fn accounts(n: usize) -> Vec<AccountId> {
    (0..n).map(|_| AccountId::new()).collect()
}
