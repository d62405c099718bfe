//! System-wide constants for the OpenParlay settlement engine.

/// Winner's share of a resolved match's converted amount, in basis points.
pub const WINNER_SHARE_BPS: u32 = 6_900;

/// Protocol treasury's share of a resolved match's converted amount,
/// in basis points. The integer remainder after both shares goes to the
/// pooled epoch fund, never dropped.
pub const PROTOCOL_FEE_BPS: u32 = 100;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default batch size for the match-accumulation settlement phase.
pub const DEFAULT_ACCUMULATE_BATCH: usize = 50;

/// Default batch size for the payout-distribution settlement phase.
pub const DEFAULT_PAYOUT_BATCH: usize = 50;

/// Default fee tier for concentrated-liquidity conversions, in
/// parts-per-million, when the routing hint carries none.
pub const DEFAULT_CL_FEE_PPM: u32 = 3_000;

/// Parts-per-million denominator for adapter fees.
pub const PPM_DENOMINATOR: u32 = 1_000_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenParlay";
