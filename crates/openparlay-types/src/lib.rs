//! # openparlay-types
//!
//! Shared types, errors, and configuration for the **OpenParlay** wager
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`MatchId`], [`AccountId`], [`EpochId`]
//! - **Token model**: [`Token`], [`TokenPair`]
//! - **Wager model**: [`WagerMatch`], [`MatchLeg`], [`MatchStatus`]
//! - **Epoch model**: [`Epoch`], [`EpochState`]
//! - **Settlement model**: [`SettlementProgress`]
//! - **Routing**: [`RoutingHint`]
//! - **Roles**: [`Role`]
//! - **Configuration**: [`EngineConfig`], [`ProceedsSplit`]
//! - **Errors**: [`OpenparlayError`] with `OP_ERR_` prefix codes
//! - **Constants**: split policy and system-wide defaults

pub mod config;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod ids;
pub mod progress;
pub mod role;
pub mod routing;
pub mod token;
pub mod wager;

#[cfg(feature = "test-helpers")]
pub mod fixtures;

// Re-export all primary types at crate root for ergonomic imports:
//   use openparlay_types::{WagerMatch, Epoch, RoutingHint, ...};

pub use config::*;
pub use epoch::*;
pub use error::*;
pub use ids::*;
pub use progress::*;
pub use role::*;
pub use routing::*;
pub use token::*;
pub use wager::*;

// Constants are accessed via `openparlay_types::constants::FOO`
// (not re-exported to avoid name collisions).
