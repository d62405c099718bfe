//! # openparlay-escrow
//!
//! **Custody Plane**: vault accounting, authorization gating, reentrancy
//! guarding, the per-match escrow state machine, and the epoch ledger.
//!
//! ## Architecture
//!
//! The Custody Plane sits between callers and the settlement pipeline:
//! 1. **Vault**: holder-keyed source of truth for all funds, with a
//!    conservation auditor
//! 2. **RoleBook / AccessGate**: capability-gated authorization checked
//!    by every mutating operation
//! 3. **ReentrancyGuard**: exclusive per-match / per-epoch locks held for
//!    an operation's duration
//! 4. **MatchBook**: PENDING → DEPOSITED_ONE → ACTIVE → {RESOLVED |
//!    REFUNDED} escrow-swap-split state machine
//! 5. **EpochLedger**: epoch lifecycle (OPEN → CLOSED → SETTLED) and
//!    pooled per-token deposit totals
//!
//! ## Funds Flow
//!
//! ```text
//! Player balance → MatchBook.deposit_stake() → match escrow
//!   → MatchBook.resolve() → winner / treasury / epoch pool
//!   → (epoch close) → settlement pipeline
//! ```

pub mod access;
pub mod conservation;
pub mod epoch_ledger;
pub mod guard;
pub mod match_escrow;
pub mod vault;

pub use access::{AccessGate, RoleBook};
pub use conservation::Conservation;
pub use epoch_ledger::EpochLedger;
pub use guard::{EntryGuard, ReentrancyGuard, ResourceKey};
pub use match_escrow::MatchBook;
pub use vault::{Holder, Vault};
