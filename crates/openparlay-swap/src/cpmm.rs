//! Constant-product path-routing adapter.
//!
//! Pools hold two reserves with `x·y = k` pricing and a per-pool input
//! fee. A conversion is one pool swap, or two chained swaps when the
//! routing hint names an intermediate token. Both legs are quoted before
//! either is committed, so a failing second leg leaves the first pool
//! untouched.

use std::collections::HashMap;

use rust_decimal::Decimal;

use openparlay_types::{
    OpenparlayError, Result, RoutingHint, TokenPair, constants::PPM_DENOMINATOR,
};

use crate::adapter::ConversionAdapter;

/// Reserves of one constant-product pool, keyed by the pair's canonical
/// (lo, hi) token ordering.
#[derive(Debug, Clone)]
pub struct CpmmPool {
    pub reserve_lo: Decimal,
    pub reserve_hi: Decimal,
    /// Input fee in parts-per-million, retained by the pool.
    pub fee_ppm: u32,
}

/// A quoted-but-uncommitted single-pool swap.
struct LegQuote {
    pair: TokenPair,
    from_is_lo: bool,
    amount_in: Decimal,
    amount_out: Decimal,
}

/// Constant-product (`x·y = k`) conversion adapter with optional
/// one-intermediate path routing.
#[derive(Debug, Default)]
pub struct CpmmAdapter {
    pools: HashMap<TokenPair, CpmmPool>,
}

impl CpmmAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a pool for `(a, b)` with the given reserves and fee.
    ///
    /// # Panics
    /// Panics if `a == b` — a pool of a token with itself is a fixture bug.
    #[must_use]
    pub fn with_pool(
        mut self,
        a: &str,
        b: &str,
        reserve_a: Decimal,
        reserve_b: Decimal,
        fee_ppm: u32,
    ) -> Self {
        let pair = TokenPair::new(a, b).expect("pool tokens must differ");
        let (reserve_lo, reserve_hi) = if pair.lo() == a {
            (reserve_a, reserve_b)
        } else {
            (reserve_b, reserve_a)
        };
        self.pools.insert(
            pair,
            CpmmPool {
                reserve_lo,
                reserve_hi,
                fee_ppm,
            },
        );
        self
    }

    /// Current reserves of the `(a, b)` pool, in `(a, b)` order.
    #[must_use]
    pub fn reserves(&self, a: &str, b: &str) -> Option<(Decimal, Decimal)> {
        let pair = TokenPair::new(a, b)?;
        let pool = self.pools.get(&pair)?;
        if pair.lo() == a {
            Some((pool.reserve_lo, pool.reserve_hi))
        } else {
            Some((pool.reserve_hi, pool.reserve_lo))
        }
    }

    /// Quote one pool swap without committing it.
    fn quote_leg(&self, from: &str, to: &str, amount_in: Decimal) -> Result<LegQuote> {
        let pair = TokenPair::new(from, to).ok_or_else(|| OpenparlayError::UnknownPool {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        let pool = self
            .pools
            .get(&pair)
            .ok_or_else(|| OpenparlayError::UnknownPool {
                from: from.to_string(),
                to: to.to_string(),
            })?;

        let from_is_lo = pair.lo() == from;
        let (reserve_in, reserve_out) = if from_is_lo {
            (pool.reserve_lo, pool.reserve_hi)
        } else {
            (pool.reserve_hi, pool.reserve_lo)
        };

        let in_after_fee = amount_in * Decimal::from(PPM_DENOMINATOR - pool.fee_ppm)
            / Decimal::from(PPM_DENOMINATOR);
        let amount_out = (reserve_out * in_after_fee / (reserve_in + in_after_fee)).floor();

        if amount_out <= Decimal::ZERO {
            return Err(OpenparlayError::ConversionFailed {
                reason: format!("input {amount_in} of {from} buys zero {to}"),
            });
        }

        Ok(LegQuote {
            pair,
            from_is_lo,
            amount_in,
            amount_out,
        })
    }

    /// Commit a previously quoted swap against the pool reserves.
    fn apply_leg(&mut self, leg: &LegQuote) {
        let pool = self
            .pools
            .get_mut(&leg.pair)
            .expect("quoted pool must exist");
        if leg.from_is_lo {
            pool.reserve_lo += leg.amount_in;
            pool.reserve_hi -= leg.amount_out;
        } else {
            pool.reserve_hi += leg.amount_in;
            pool.reserve_lo -= leg.amount_out;
        }
    }
}

impl ConversionAdapter for CpmmAdapter {
    fn convert(
        &mut self,
        from: &str,
        to: &str,
        amount_in: Decimal,
        min_out: Decimal,
        hint: &RoutingHint,
    ) -> Result<Decimal> {
        if amount_in <= Decimal::ZERO {
            return Err(OpenparlayError::NonPositiveAmount(amount_in));
        }

        let legs: Vec<LegQuote> = match &hint.intermediate {
            None => vec![self.quote_leg(from, to, amount_in)?],
            Some(mid) => {
                let first = self.quote_leg(from, mid, amount_in)?;
                let second = self.quote_leg(mid, to, first.amount_out)?;
                vec![first, second]
            }
        };

        let amount_out = legs.last().map_or(Decimal::ZERO, |leg| leg.amount_out);
        if amount_out < min_out {
            return Err(OpenparlayError::SlippageExceeded {
                min_out,
                actual: amount_out,
            });
        }

        // All legs quoted; nothing has failed. Commit.
        for leg in &legs {
            self.apply_leg(leg);
        }

        tracing::debug!(
            from,
            to,
            %amount_in,
            %amount_out,
            hops = legs.len(),
            "CPMM conversion executed"
        );
        Ok(amount_out)
    }
}
