//! Error types for the OpenParlay settlement engine.
//!
//! All errors use the `OP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization / entry-gate errors
//! - 2xx: Match errors
//! - 3xx: Epoch errors
//! - 4xx: Settlement pipeline errors
//! - 5xx: Conversion / adapter errors
//! - 6xx: Funds errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, EpochId, EpochState, MatchId, MatchStatus, Role, Token};

/// Central error enum for all OpenParlay operations.
#[derive(Debug, Error)]
pub enum OpenparlayError {
    // =================================================================
    // Authorization / entry-gate errors (1xx)
    // =================================================================
    /// The caller does not hold the capability role the operation requires.
    #[error("OP_ERR_100: Unauthorized: {caller} lacks role {role}")]
    Unauthorized { caller: AccountId, role: Role },

    /// A guarded operation was re-entered while already in flight on the
    /// same resource.
    #[error("OP_ERR_101: Reentrant call blocked on {resource}")]
    ReentrancyBlocked { resource: String },

    // =================================================================
    // Match errors (2xx)
    // =================================================================
    /// The requested match was not found.
    #[error("OP_ERR_200: Match not found: {0}")]
    MatchNotFound(MatchId),

    /// A match with this ID already exists.
    #[error("OP_ERR_201: Match already exists: {0}")]
    DuplicateMatch(MatchId),

    /// The match is in the wrong lifecycle status for this operation.
    #[error("OP_ERR_202: Wrong match status: expected {expected}, got {actual}")]
    WrongMatchStatus {
        expected: MatchStatus,
        actual: MatchStatus,
    },

    /// The named account is not one of the two match participants.
    #[error("OP_ERR_203: {account} is not a participant of match {match_id}")]
    NotAParticipant {
        match_id: MatchId,
        account: AccountId,
    },

    /// The wager declaration failed validation (zero amount, same player
    /// on both legs, etc.).
    #[error("OP_ERR_204: Invalid wager: {reason}")]
    InvalidWager { reason: String },

    /// This participant's stake is already deposited.
    #[error("OP_ERR_205: Stake already deposited by {account} for match {match_id}")]
    StakeAlreadyDeposited {
        match_id: MatchId,
        account: AccountId,
    },

    // =================================================================
    // Epoch errors (3xx)
    // =================================================================
    /// The requested epoch was not found.
    #[error("OP_ERR_300: Epoch not found: {0}")]
    EpochNotFound(EpochId),

    /// The epoch is in the wrong lifecycle state for this operation.
    #[error("OP_ERR_301: Wrong epoch state: expected {expected}, got {actual}")]
    WrongEpochState {
        expected: EpochState,
        actual: EpochState,
    },

    /// The token is not in the epoch's eligible snapshot.
    #[error("OP_ERR_302: Token {token} not eligible in {epoch_id}")]
    TokenNotEligible { epoch_id: EpochId, token: Token },

    /// An epoch must be opened with at least one eligible token.
    #[error("OP_ERR_303: Cannot open an epoch with an empty token set")]
    EmptyTokenSet,

    // =================================================================
    // Settlement pipeline errors (4xx)
    // =================================================================
    /// A settlement phase was invoked before `initialize`.
    #[error("OP_ERR_400: Settlement not initialized for {0}")]
    SettlementNotInitialized(EpochId),

    /// `initialize` was called twice for the same epoch.
    #[error("OP_ERR_401: Settlement already initialized for {0}")]
    SettlementAlreadyInitialized(EpochId),

    /// Pool conversion requires every match to be accumulated first.
    #[error("OP_ERR_402: Matches not fully accumulated: {processed} of {total}")]
    MatchesNotAccumulated { processed: usize, total: usize },

    /// Payout distribution requires the pool to be converted first.
    #[error("OP_ERR_403: Pool not yet converted for {0}")]
    PoolNotConverted(EpochId),

    /// The pool conversion phase already ran for this epoch.
    #[error("OP_ERR_404: Pool already converted for {0}")]
    PoolAlreadyConverted(EpochId),

    /// Every participant has already been paid.
    #[error("OP_ERR_405: Payouts already fully distributed for {0}")]
    AlreadyFullyPaid(EpochId),

    // =================================================================
    // Conversion / adapter errors (5xx)
    // =================================================================
    /// No adapter is registered for this token pair.
    #[error("OP_ERR_500: No conversion adapter configured for {from}/{to}")]
    AdapterNotConfigured { from: Token, to: Token },

    /// The conversion adapter failed to execute the exchange.
    #[error("OP_ERR_501: Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// The adapter has no pool (or fee tier) for the requested route leg.
    #[error("OP_ERR_502: No pool for {from}/{to}")]
    UnknownPool { from: Token, to: Token },

    /// The realized output fell below the caller's minimum.
    #[error("OP_ERR_503: Output {actual} below minimum {min_out}")]
    SlippageExceeded { min_out: Decimal, actual: Decimal },

    // =================================================================
    // Funds errors (6xx)
    // =================================================================
    /// Not enough balance held to perform the operation.
    #[error("OP_ERR_600: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// The amount must be strictly positive.
    #[error("OP_ERR_601: Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Supply conservation invariant violated — critical safety alert.
    #[error("OP_ERR_602: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid share split, etc.).
    #[error("OP_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenparlayError>;
