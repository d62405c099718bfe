//! The conversion-adapter capability boundary.
//!
//! Everything the settlement engine knows about token exchange is this
//! trait. Concrete adapters own their market state (pool reserves, fee
//! tiers) and are selected per token pair via the [`crate::AdapterRegistry`],
//! never via type inspection.

use rust_decimal::Decimal;
use openparlay_types::{Result, RoutingHint};

/// Converts an exact input amount of one token into another.
///
/// # Contract
///
/// One call is one atomic unit of work: on success, the adapter has
/// executed the exchange against its own market state and the returned
/// `amount_out` is at least `min_out`. On **any** failure the adapter must
/// have mutated nothing — callers treat a failed conversion as a no-op
/// and keep the input amount.
///
/// `hint` carries adapter-specific routing data; an absent intermediate
/// means a direct two-token route.
pub trait ConversionAdapter: std::fmt::Debug {
    /// Execute the conversion, returning the realized output amount.
    fn convert(
        &mut self,
        from: &str,
        to: &str,
        amount_in: Decimal,
        min_out: Decimal,
        hint: &RoutingHint,
    ) -> Result<Decimal>;
}
