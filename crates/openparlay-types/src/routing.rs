//! Routing hints passed opaquely through to conversion adapters.

use serde::{Deserialize, Serialize};

use crate::Token;

/// Adapter-specific routing data for one conversion.
///
/// The engine never interprets this beyond forwarding it; absence of an
/// intermediate token means a direct two-token route, and `fee_ppm` is
/// only meaningful to adapters with explicit fee tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingHint {
    /// Optional intermediate token to hop through (A → X → B).
    pub intermediate: Option<Token>,
    /// Optional fee parameter in parts-per-million.
    pub fee_ppm: Option<u32>,
}

impl RoutingHint {
    /// A direct route with no adapter-specific parameters.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// Route through `token` as an intermediate hop.
    #[must_use]
    pub fn via(token: impl Into<Token>) -> Self {
        Self {
            intermediate: Some(token.into()),
            fee_ppm: None,
        }
    }

    /// Select an explicit fee tier.
    #[must_use]
    pub fn with_fee_ppm(mut self, fee_ppm: u32) -> Self {
        self.fee_ppm = Some(fee_ppm);
        self
    }
}
