//! # openparlay-swap
//!
//! **Conversion Plane**: the [`ConversionAdapter`] capability boundary,
//! its two concrete path-routing variants, and the pair-keyed registry.
//!
//! ## Architecture
//!
//! The settlement engine treats token exchange as an opaque capability:
//! `convert(from, to, amount_in, min_out, hint) -> amount_out`, atomic on
//! success and a guaranteed no-op on failure. Variants:
//!
//! 1. **CpmmAdapter**: constant-product (`x·y = k`) pools, per-pool fee,
//!    optional one-intermediate path routing
//! 2. **ClmmAdapter**: concentrated-liquidity pools keyed by fee tier,
//!    the tier selected by the routing hint's explicit fee parameter
//!
//! [`AdapterRegistry`] selects the adapter per unordered token pair;
//! absence of an adapter is a valid, checked state.

pub mod adapter;
pub mod clmm;
pub mod cpmm;
pub mod registry;

pub use adapter::ConversionAdapter;
pub use clmm::ClmmAdapter;
pub use cpmm::CpmmAdapter;
pub use registry::AdapterRegistry;
