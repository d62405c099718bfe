//! # openparlay-settlement
//!
//! **Settlement Plane**: the resumable four-phase epoch pipeline,
//! participant payout bookkeeping, failed-conversion recovery, the audit
//! trail, and the [`ParlayEngine`] facade that wires every plane together
//! behind capability checks and reentrancy locks.
//!
//! ## Pipeline
//!
//! 1. **Initialize**: designate the settlement token (CLOSED epoch, once)
//! 2. **AccumulateMatches**: bounded slices building participant weights
//! 3. **ConvertPool**: per-token fault-tolerant conversion into the
//!    settlement token
//! 4. **DistributePayouts**: bounded, dust-free, atomically committed
//!    payout batches; CLOSED → SETTLED on completion
//!
//! The accounting discipline throughout: exact, dust-free, idempotent
//! distribution. Batches of any size converge to the same final state,
//! and the payout sum always equals the converted pool balance exactly.

pub mod audit;
pub mod engine;
pub mod failed;
pub mod participants;
pub mod pipeline;

pub use audit::{AuditKind, AuditRecord, AuditTrail};
pub use engine::ParlayEngine;
pub use failed::FailedConversionLedger;
pub use participants::ParticipantBook;
pub use pipeline::{ConversionReport, Payout, SettlementPipeline};
