//! Concentrated-liquidity path-routing adapter.
//!
//! Pools are keyed by (pair, fee tier); the tier comes from the routing
//! hint's explicit fee parameter, falling back to the default tier. Swap
//! math is the in-range concentrated-liquidity form: a pool is a virtual
//! liquidity figure `L` and a square-root price, and an exact-in swap
//! moves the price along the curve.
//!
//! With `lo` as token0 and price quoted as hi-per-lo:
//! selling lo:  √P' = L·√P / (L + Δin·√P),  out = L·(√P − √P')
//! selling hi:  √P' = √P + Δin/L,            out = L·(1/√P − 1/√P')

use std::collections::HashMap;

use rust_decimal::Decimal;

use openparlay_types::{
    OpenparlayError, Result, RoutingHint, TokenPair,
    constants::{DEFAULT_CL_FEE_PPM, PPM_DENOMINATOR},
};

use crate::adapter::ConversionAdapter;

/// One in-range concentrated-liquidity pool.
#[derive(Debug, Clone)]
pub struct ClPool {
    /// Virtual liquidity, constant across in-range swaps.
    pub liquidity: Decimal,
    /// √(hi-per-lo price).
    pub sqrt_price: Decimal,
}

/// A quoted-but-uncommitted swap against one pool.
struct LegQuote {
    key: (TokenPair, u32),
    new_sqrt_price: Decimal,
    amount_out: Decimal,
}

/// Concentrated-liquidity conversion adapter with explicit fee tiers and
/// optional one-intermediate path routing.
#[derive(Debug, Default)]
pub struct ClmmAdapter {
    pools: HashMap<(TokenPair, u32), ClPool>,
}

impl ClmmAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a pool for `(a, b)` at `fee_ppm` with virtual
    /// liquidity and a starting √price (hi-per-lo).
    ///
    /// # Panics
    /// Panics if `a == b`.
    #[must_use]
    pub fn with_pool(
        mut self,
        a: &str,
        b: &str,
        fee_ppm: u32,
        liquidity: Decimal,
        sqrt_price: Decimal,
    ) -> Self {
        let pair = TokenPair::new(a, b).expect("pool tokens must differ");
        self.pools.insert(
            (pair, fee_ppm),
            ClPool {
                liquidity,
                sqrt_price,
            },
        );
        self
    }

    /// Current √price of the `(a, b)` pool at `fee_ppm`, if present.
    #[must_use]
    pub fn sqrt_price(&self, a: &str, b: &str, fee_ppm: u32) -> Option<Decimal> {
        let pair = TokenPair::new(a, b)?;
        self.pools.get(&(pair, fee_ppm)).map(|p| p.sqrt_price)
    }

    fn quote_leg(
        &self,
        from: &str,
        to: &str,
        amount_in: Decimal,
        fee_ppm: u32,
    ) -> Result<LegQuote> {
        let unknown = || OpenparlayError::UnknownPool {
            from: from.to_string(),
            to: to.to_string(),
        };
        let pair = TokenPair::new(from, to).ok_or_else(unknown)?;
        let pool = self.pools.get(&(pair.clone(), fee_ppm)).ok_or_else(unknown)?;

        if pool.liquidity <= Decimal::ZERO || pool.sqrt_price <= Decimal::ZERO {
            return Err(OpenparlayError::ConversionFailed {
                reason: format!("pool {pair} at {fee_ppm}ppm has no liquidity"),
            });
        }

        let in_after_fee =
            amount_in * Decimal::from(PPM_DENOMINATOR - fee_ppm) / Decimal::from(PPM_DENOMINATOR);
        let (l, sp) = (pool.liquidity, pool.sqrt_price);

        let (new_sqrt_price, amount_out) = if pair.lo() == from {
            // Selling lo: price falls.
            let new_sp = l * sp / (l + in_after_fee * sp);
            (new_sp, (l * (sp - new_sp)).floor())
        } else {
            // Selling hi: price rises.
            let new_sp = sp + in_after_fee / l;
            (new_sp, (l * (Decimal::ONE / sp - Decimal::ONE / new_sp)).floor())
        };

        if amount_out <= Decimal::ZERO {
            return Err(OpenparlayError::ConversionFailed {
                reason: format!("input {amount_in} of {from} buys zero {to}"),
            });
        }

        Ok(LegQuote {
            key: (pair, fee_ppm),
            new_sqrt_price,
            amount_out,
        })
    }

    fn apply_leg(&mut self, leg: &LegQuote) {
        let pool = self.pools.get_mut(&leg.key).expect("quoted pool must exist");
        pool.sqrt_price = leg.new_sqrt_price;
    }
}

impl ConversionAdapter for ClmmAdapter {
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
        let fee_ppm = hint.fee_ppm.unwrap_or(DEFAULT_CL_FEE_PPM);

        let legs: Vec<LegQuote> = match &hint.intermediate {
            None => vec![self.quote_leg(from, to, amount_in, fee_ppm)?],
            Some(mid) => {
                let first = self.quote_leg(from, mid, amount_in, fee_ppm)?;
                let second = self.quote_leg(mid, to, first.amount_out, fee_ppm)?;
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

        for leg in &legs {
            self.apply_leg(leg);
        }

        tracing::debug!(
            from,
            to,
            %amount_in,
            %amount_out,
            fee_ppm,
            hops = legs.len(),
            "CL conversion executed"
        );
        Ok(amount_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    /// MEME/USDT at 1:1, deep liquidity, default tier.
    fn adapter() -> ClmmAdapter {
        ClmmAdapter::new().with_pool(
            "MEME",
            "USDT",
            DEFAULT_CL_FEE_PPM,
            dec(1_000_000),
            Decimal::ONE,
        )
    }

    #[test]
    fn sell_lo_side_moves_price_down() {
        let mut clmm = adapter();
        let out = clmm
            .convert("MEME", "USDT", dec(1_000), Decimal::ZERO, &RoutingHint::direct())
            .unwrap();
        assert_eq!(out, dec(996));
        let sp = clmm.sqrt_price("MEME", "USDT", DEFAULT_CL_FEE_PPM).unwrap();
        assert!(sp < Decimal::ONE);
    }

    #[test]
    fn sell_hi_side_moves_price_up() {
        let mut clmm = adapter();
        let out = clmm
            .convert("USDT", "MEME", dec(1_000), Decimal::ZERO, &RoutingHint::direct())
            .unwrap();
        assert_eq!(out, dec(996));
        let sp = clmm.sqrt_price("MEME", "USDT", DEFAULT_CL_FEE_PPM).unwrap();
        assert!(sp > Decimal::ONE);
    }

    #[test]
    fn fee_tier_comes_from_hint() {
        let mut clmm = ClmmAdapter::new().with_pool(
            "MEME",
            "USDT",
            500,
            dec(1_000_000),
            Decimal::ONE,
        );
        // Default tier has no pool.
        let err = clmm
            .convert("MEME", "USDT", dec(1_000), Decimal::ZERO, &RoutingHint::direct())
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::UnknownPool { .. }));

        let out = clmm
            .convert(
                "MEME",
                "USDT",
                dec(1_000),
                Decimal::ZERO,
                &RoutingHint::direct().with_fee_ppm(500),
            )
            .unwrap();
        // Lower fee tier, slightly better output.
        assert_eq!(out, dec(998));
    }

    #[test]
    fn two_hop_route() {
        let mut clmm = adapter().with_pool(
            "PLAY",
            "USDT",
            DEFAULT_CL_FEE_PPM,
            dec(1_000_000),
            Decimal::ONE,
        );
        let out = clmm
            .convert("MEME", "PLAY", dec(1_000), Decimal::ZERO, &RoutingHint::via("USDT"))
            .unwrap();
        assert!(out > dec(990) && out < dec(996));
    }

    #[test]
    fn min_out_enforced_without_mutation() {
        let mut clmm = adapter();
        let before = clmm.sqrt_price("MEME", "USDT", DEFAULT_CL_FEE_PPM).unwrap();
        let err = clmm
            .convert("MEME", "USDT", dec(1_000), dec(10_000), &RoutingHint::direct())
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::SlippageExceeded { .. }));
        let after = clmm.sqrt_price("MEME", "USDT", DEFAULT_CL_FEE_PPM).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_pool_fails() {
        let mut clmm = ClmmAdapter::new().with_pool(
            "MEME",
            "USDT",
            DEFAULT_CL_FEE_PPM,
            Decimal::ZERO,
            Decimal::ONE,
        );
        let err = clmm
            .convert("MEME", "USDT", dec(100), Decimal::ZERO, &RoutingHint::direct())
            .unwrap_err();
        assert!(matches!(err, OpenparlayError::ConversionFailed { .. }));
    }
}
