//! The resumable four-phase settlement pipeline.
//!
//! Turns a closed epoch's ledger snapshot into per-participant payouts:
//!
//! 1. **initialize** — designate the settlement token (CLOSED epoch only,
//!    once)
//! 2. **accumulate_matches** — bounded slices over the epoch's matches,
//!    building participant weights
//! 3. **convert_pool** — convert every pooled token into the settlement
//!    token, fault-tolerant per token
//! 4. **distribute_payouts** — bounded payout batches, dust-free
//!
//! Each phase is independently invocable and resumable; progress fields
//! only ever advance, so repeated or interleaved invocations with
//! arbitrary batch sizes converge to the same final state. No phase ever
//! does unbounded work in a single invocation except `convert_pool`,
//! which is bounded by the epoch's (fixed, small) token snapshot.

use std::collections::HashMap;

use openparlay_escrow::{EpochLedger, Holder, MatchBook, Vault};
use openparlay_swap::AdapterRegistry;
use openparlay_types::{
    AccountId, EpochId, MatchStatus, OpenparlayError, Result, RoutingHint,
    SettlementProgress, Token,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::failed::FailedConversionLedger;
use crate::participants::ParticipantBook;

/// One payout made by the distribution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub account: AccountId,
    pub amount: Decimal,
}

/// Outcome of one `convert_pool` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Settlement-token balance after this phase.
    pub pool_balance: Decimal,
    /// Tokens successfully converted (or passed through).
    pub converted_tokens: usize,
    /// Tokens whose conversion failed and was ledgered for recovery.
    pub failed_tokens: Vec<Token>,
}

/// Per-epoch settlement state: the resumable cursor plus the participant
/// book it advances through.
#[derive(Debug, Default)]
pub struct SettlementPipeline {
    progress: HashMap<EpochId, SettlementProgress>,
    participants: HashMap<EpochId, ParticipantBook>,
}

impl SettlementPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: designate the settlement token and create the progress
    /// record. Requires the epoch CLOSED; fails if already initialized.
    pub fn initialize(
        &mut self,
        ledger: &mut EpochLedger,
        epoch_id: EpochId,
        settlement_token: &str,
    ) -> Result<()> {
        if self.progress.contains_key(&epoch_id) {
            return Err(OpenparlayError::SettlementAlreadyInitialized(epoch_id));
        }
        ledger.set_settlement_token(epoch_id, settlement_token)?;
        self.progress
            .insert(epoch_id, SettlementProgress::new(settlement_token));
        self.participants
            .insert(epoch_id, ParticipantBook::new());
        tracing::info!(epoch = %epoch_id, settlement_token, "Settlement initialized");
        Ok(())
    }

    /// Phase 2: examine the next `limit` matches of the epoch, crediting
    /// wager weight to winners whose winning token is the settlement
    /// token. Returns how many matches were examined.
    ///
    /// Idempotent resumption: the cursor only advances past examined
    /// matches, and an over-large `limit` processes only what remains.
    pub fn accumulate_matches(
        &mut self,
        matches: &MatchBook,
        epoch_id: EpochId,
        limit: usize,
    ) -> Result<usize> {
        let progress = self
            .progress
            .get_mut(&epoch_id)
            .ok_or(OpenparlayError::SettlementNotInitialized(epoch_id))?;
        let book = self
            .participants
            .get_mut(&epoch_id)
            .ok_or(OpenparlayError::SettlementNotInitialized(epoch_id))?;

        let ids = matches.matches_in_epoch(epoch_id);
        let start = progress.processed_matches;
        let end = ids.len().min(start + limit);

        for match_id in &ids[start..end] {
            let m = matches.get(*match_id)?;
            // Refunded or never-activated matches carry no weight.
            if m.status != MatchStatus::Resolved {
                continue;
            }
            let Some(winner) = m.winner else { continue };
            let Some(leg) = m.winning_leg() else { continue };
            if leg.token != progress.settlement_token {
                continue;
            }
            book.add_weight(winner, leg.amount);
            progress.total_weight += leg.amount;
        }

        progress.processed_matches = end;
        progress.participant_count = book.len();
        tracing::debug!(
            epoch = %epoch_id,
            examined = end - start,
            cursor = end,
            total = ids.len(),
            participants = book.len(),
            "Matches accumulated"
        );
        Ok(end - start)
    }

    /// Phase 3: convert every pooled token into the settlement token.
    ///
    /// Fault-tolerant at per-token granularity: a failed conversion
    /// (including a missing adapter) moves that token's pool into the
    /// failed-conversion ledger instead of aborting the others. The
    /// settlement token's own deposits pass through unconverted.
    #[allow(clippy::too_many_arguments)]
    pub fn convert_pool(
        &mut self,
        ledger: &EpochLedger,
        matches: &MatchBook,
        vault: &mut Vault,
        registry: &mut AdapterRegistry,
        failed: &mut FailedConversionLedger,
        epoch_id: EpochId,
        hint: &RoutingHint,
    ) -> Result<ConversionReport> {
        let progress = self
            .progress
            .get_mut(&epoch_id)
            .ok_or(OpenparlayError::SettlementNotInitialized(epoch_id))?;
        if progress.converted {
            return Err(OpenparlayError::PoolAlreadyConverted(epoch_id));
        }
        // Completeness gate: every match examined before converting.
        let total = matches.count_in_epoch(epoch_id);
        if progress.processed_matches < total {
            return Err(OpenparlayError::MatchesNotAccumulated {
                processed: progress.processed_matches,
                total,
            });
        }

        let epoch = ledger.epoch(epoch_id)?;
        let settlement_token = progress.settlement_token.clone();
        let pool = Holder::EpochPool(epoch_id);

        let mut converted_tokens = 0_usize;
        let mut failed_tokens: Vec<Token> = Vec::new();

        for token in &epoch.eligible_tokens {
            let amount = ledger.deposits(epoch_id, token);
            if amount.is_zero() {
                continue;
            }
            if *token == settlement_token {
                progress.pool_balance += amount;
                converted_tokens += 1;
                continue;
            }

            let outcome = registry
                .route(token, &settlement_token)
                .and_then(|adapter| {
                    adapter.convert(token, &settlement_token, amount, Decimal::ZERO, hint)
                });
            match outcome {
                Ok(output) => {
                    vault.convert_holding(pool, token, amount, &settlement_token, output)?;
                    progress.pool_balance += output;
                    converted_tokens += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        epoch = %epoch_id,
                        %token,
                        %amount,
                        %err,
                        "Pool conversion failed; amount ledgered for recovery"
                    );
                    vault.transfer(pool, Holder::FailedPool, token, amount)?;
                    failed.record(token, amount);
                    failed_tokens.push(token.clone());
                }
            }
        }

        progress.converted = true;
        tracing::info!(
            epoch = %epoch_id,
            pool_balance = %progress.pool_balance,
            converted_tokens,
            failed = failed_tokens.len(),
            "Pool converted"
        );
        Ok(ConversionReport {
            pool_balance: progress.pool_balance,
            converted_tokens,
            failed_tokens,
        })
    }

    /// Phase 4: pay up to `limit` participants, in first-seen order.
    ///
    /// Each participant receives `floor(weight × pool_balance /
    /// total_weight)`; the final participant of the whole list instead
    /// receives the exact remainder, so the payout sum always equals the
    /// pool balance. The batch is staged and committed atomically: a
    /// transfer that cannot be honored aborts the invocation with the
    /// cursor unchanged. Paying the last participant transitions the
    /// epoch CLOSED → SETTLED.
    pub fn distribute_payouts(
        &mut self,
        ledger: &mut EpochLedger,
        vault: &mut Vault,
        epoch_id: EpochId,
        limit: usize,
    ) -> Result<Vec<Payout>> {
        let progress = self
            .progress
            .get_mut(&epoch_id)
            .ok_or(OpenparlayError::SettlementNotInitialized(epoch_id))?;
        if !progress.converted {
            return Err(OpenparlayError::PoolNotConverted(epoch_id));
        }
        if progress.fully_paid {
            return Err(OpenparlayError::AlreadyFullyPaid(epoch_id));
        }
        let book = self
            .participants
            .get_mut(&epoch_id)
            .ok_or(OpenparlayError::SettlementNotInitialized(epoch_id))?;

        // An epoch with no eligible participants settles immediately; any
        // unclaimed pool balance stays under the epoch pool holder,
        // recoverable by administrative sweep.
        if book.is_empty() {
            progress.fully_paid = true;
            ledger.mark_settled(epoch_id)?;
            tracing::info!(epoch = %epoch_id, "No participants; epoch settled empty");
            return Ok(Vec::new());
        }

        let start = book
            .first_unpaid()
            .ok_or_else(|| OpenparlayError::Internal("unpaid cursor lost".into()))?;
        let end = book.len().min(start + limit);
        let token = progress.settlement_token.clone();
        let pool = Holder::EpochPool(epoch_id);

        // Stage the whole batch before touching the vault.
        let mut staged: Vec<(usize, Payout)> = Vec::with_capacity(end - start);
        let mut staged_sum = Decimal::ZERO;
        for index in start..end {
            let account = book
                .at(index)
                .ok_or_else(|| OpenparlayError::Internal("participant index out of range".into()))?;
            let amount = if index == book.len() - 1 {
                // Exact-distribution rule: the last participant absorbs
                // all floor-division rounding.
                progress.pool_balance - progress.paid_out - staged_sum
            } else {
                (book.weight(account) * progress.pool_balance / progress.total_weight).floor()
            };
            staged_sum += amount;
            staged.push((index, Payout { account, amount }));
        }

        let available = vault.balance(pool, &token);
        if available < staged_sum {
            return Err(OpenparlayError::InsufficientFunds {
                needed: staged_sum,
                available,
            });
        }

        // Commit: these transfers are covered by the balance check above.
        let mut payouts = Vec::with_capacity(staged.len());
        for (index, payout) in staged {
            if payout.amount > Decimal::ZERO {
                vault.transfer(pool, Holder::Player(payout.account), &token, payout.amount)?;
            }
            book.mark_paid(index);
            progress.paid_out += payout.amount;
            tracing::debug!(
                epoch = %epoch_id,
                account = %payout.account,
                amount = %payout.amount,
                position = index,
                "Payout issued"
            );
            payouts.push(payout);
        }

        if book.all_paid() {
            progress.fully_paid = true;
            ledger.mark_settled(epoch_id)?;
            tracing::info!(
                epoch = %epoch_id,
                paid_out = %progress.paid_out,
                participants = book.len(),
                "Distribution complete; epoch settled"
            );
        }
        Ok(payouts)
    }

    /// Settlement progress for one epoch, if initialized.
    #[must_use]
    pub fn progress(&self, epoch_id: EpochId) -> Option<&SettlementProgress> {
        self.progress.get(&epoch_id)
    }

    /// Participant book for one epoch, if initialized.
    #[must_use]
    pub fn participants(&self, epoch_id: EpochId) -> Option<&ParticipantBook> {
        self.participants.get(&epoch_id)
    }
}
