//! Audit trail — append-only record of significant engine actions.
//!
//! Each record commits to its detail string with a SHA-256 hash so an
//! exported trail can be checked for tampering. This is an observability
//! surface, not a persistence layer: it lives and dies with the engine.

use chrono::{DateTime, Utc};
use openparlay_types::{EpochId, MatchId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The kinds of actions worth an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditKind {
    MatchResolved,
    MatchRefunded,
    PoolConverted,
    ConversionFailureRecorded,
    PayoutIssued,
    EpochSettled,
    SweepExecuted,
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchResolved => write!(f, "MATCH_RESOLVED"),
            Self::MatchRefunded => write!(f, "MATCH_REFUNDED"),
            Self::PoolConverted => write!(f, "POOL_CONVERTED"),
            Self::ConversionFailureRecorded => write!(f, "CONVERSION_FAILURE_RECORDED"),
            Self::PayoutIssued => write!(f, "PAYOUT_ISSUED"),
            Self::EpochSettled => write!(f, "EPOCH_SETTLED"),
            Self::SweepExecuted => write!(f, "SWEEP_EXECUTED"),
        }
    }
}

/// One audit record: what happened, where, and a hash commitment over
/// the detail payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub kind: AuditKind,
    pub epoch_id: Option<EpochId>,
    pub match_id: Option<MatchId>,
    /// Human-readable detail (amounts, tokens, recipients).
    pub detail: String,
    /// SHA-256 over the detail string.
    pub detail_hash: [u8; 32],
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Hex form of the detail hash.
    #[must_use]
    pub fn detail_hash_hex(&self) -> String {
        hex::encode(self.detail_hash)
    }

    /// Whether the stored hash still matches the detail string.
    #[must_use]
    pub fn verify(&self) -> bool {
        hash_detail(&self.detail) == self.detail_hash
    }
}

fn hash_detail(detail: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"openparlay:audit:v2:");
    hasher.update(detail.as_bytes());
    hasher.finalize().into()
}

/// Append-only in-memory audit log.
#[derive(Debug, Default)]
pub struct AuditTrail {
    records: Vec<AuditRecord>,
}

impl AuditTrail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record.
    pub fn record(
        &mut self,
        kind: AuditKind,
        epoch_id: Option<EpochId>,
        match_id: Option<MatchId>,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        tracing::debug!(%kind, ?epoch_id, ?match_id, %detail, "Audit record");
        self.records.push(AuditRecord {
            kind,
            epoch_id,
            match_id,
            detail_hash: hash_detail(&detail),
            detail,
            recorded_at: Utc::now(),
        });
    }

    /// Every record, in append order.
    #[must_use]
    pub fn all(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Records for one epoch, in append order.
    #[must_use]
    pub fn by_epoch(&self, epoch_id: EpochId) -> Vec<&AuditRecord> {
        self.records
            .iter()
            .filter(|r| r.epoch_id == Some(epoch_id))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
