//! Engine facade — every external entry point of the system.
//!
//! [`ParlayEngine`] owns the vault, role book, reentrancy guard, match
//! book, epoch ledger, adapter registry, settlement pipeline, failed-
//! conversion ledger, and audit trail, and applies the entry discipline
//! uniformly: capability check first, then the per-resource reentrancy
//! lock, then delegation. Authorization and precondition failures are
//! rejected synchronously with no state change.
//!
//! Recovery entry points (treasury sweep, failed-conversion sweep,
//! settled-pool remainder sweep) live here because they cut across the
//! planes below.

use openparlay_escrow::{
    AccessGate, EpochLedger, Holder, MatchBook, ReentrancyGuard, ResourceKey, RoleBook, Vault,
};
use openparlay_swap::{AdapterRegistry, ConversionAdapter};
use openparlay_types::{
    AccountId, EngineConfig, Epoch, EpochId, EpochState, MatchId, MatchLeg, ProceedsSplit,
    Result, Role, RoutingHint, SettlementProgress, Token, WagerMatch,
};
use rust_decimal::Decimal;

use crate::audit::{AuditKind, AuditTrail};
use crate::failed::FailedConversionLedger;
use crate::pipeline::{ConversionReport, Payout, SettlementPipeline};

/// The assembled settlement engine.
pub struct ParlayEngine {
    config: EngineConfig,
    roles: RoleBook,
    guard: ReentrancyGuard,
    vault: Vault,
    registry: AdapterRegistry,
    matches: MatchBook,
    ledger: EpochLedger,
    pipeline: SettlementPipeline,
    failed: FailedConversionLedger,
    audit: AuditTrail,
}

impl std::fmt::Debug for ParlayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParlayEngine").finish_non_exhaustive()
    }
}

impl ParlayEngine {
    /// Assemble an engine with `admin` as the bootstrap administrator.
    ///
    /// # Errors
    /// Rejects an invalid share configuration.
    pub fn new(config: EngineConfig, admin: AccountId) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            roles: RoleBook::with_admin(admin),
            guard: ReentrancyGuard::new(),
            vault: Vault::new(),
            registry: AdapterRegistry::new(),
            matches: MatchBook::new(),
            ledger: EpochLedger::new(),
            pipeline: SettlementPipeline::new(),
            failed: FailedConversionLedger::new(),
            audit: AuditTrail::new(),
        })
    }

    // =====================================================================
    // Administration
    // =====================================================================

    /// Grant a capability role. Administrator only.
    pub fn grant_role(&mut self, caller: AccountId, account: AccountId, role: Role) -> Result<()> {
        self.roles.ensure(caller, Role::Administrator)?;
        self.roles.grant(account, role);
        Ok(())
    }

    /// Revoke a capability role. Administrator only.
    pub fn revoke_role(
        &mut self,
        caller: AccountId,
        account: AccountId,
        role: Role,
    ) -> Result<bool> {
        self.roles.ensure(caller, Role::Administrator)?;
        Ok(self.roles.revoke(account, role))
    }

    /// Install (or replace) the conversion adapter for a token pair.
    pub fn set_adapter(
        &mut self,
        caller: AccountId,
        a: &str,
        b: &str,
        adapter: Box<dyn ConversionAdapter>,
    ) -> Result<()> {
        self.roles.ensure(caller, Role::Administrator)?;
        self.registry.set(a, b, adapter)
    }

    /// Remove the conversion adapter for a token pair.
    pub fn clear_adapter(&mut self, caller: AccountId, a: &str, b: &str) -> Result<bool> {
        self.roles.ensure(caller, Role::Administrator)?;
        Ok(self.registry.clear(a, b))
    }

    /// Sweep protocol fee revenue to a recipient's balance, bounded by
    /// the treasury's actual holding.
    pub fn sweep_treasury(
        &mut self,
        caller: AccountId,
        token: &str,
        amount: Decimal,
        recipient: AccountId,
    ) -> Result<()> {
        self.roles.ensure(caller, Role::Administrator)?;
        let _entry = self.guard.enter(ResourceKey::Recovery)?;
        self.vault
            .transfer(Holder::Treasury, Holder::Player(recipient), token, amount)?;
        self.audit.record(
            AuditKind::SweepExecuted,
            None,
            None,
            format!("treasury sweep: {amount} {token} to {recipient}"),
        );
        tracing::info!(token, %amount, %recipient, "Treasury swept");
        Ok(())
    }

    /// Sweep the failed-conversion ledger entry for `token`, zeroing it.
    /// Returns the recovered amount.
    pub fn sweep_failed(
        &mut self,
        caller: AccountId,
        token: &str,
        recipient: AccountId,
    ) -> Result<Decimal> {
        self.roles.ensure(caller, Role::Administrator)?;
        let _entry = self.guard.enter(ResourceKey::Recovery)?;
        let amount = self.failed.balance(token);
        if amount > Decimal::ZERO {
            self.vault
                .transfer(Holder::FailedPool, Holder::Player(recipient), token, amount)?;
        }
        self.failed.sweep(token);
        self.audit.record(
            AuditKind::SweepExecuted,
            None,
            None,
            format!("failed-conversion sweep: {amount} {token} to {recipient}"),
        );
        tracing::info!(token, %amount, %recipient, "Failed-conversion ledger swept");
        Ok(amount)
    }

    /// Drain a SETTLED epoch's residual pool holding (the zero-participant
    /// case). Returns the recovered amount.
    pub fn sweep_pool_remainder(
        &mut self,
        caller: AccountId,
        epoch_id: EpochId,
        token: &str,
        recipient: AccountId,
    ) -> Result<Decimal> {
        self.roles.ensure(caller, Role::Administrator)?;
        let _entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;
        self.ledger.epoch(epoch_id)?.ensure_state(EpochState::Settled)?;
        let amount = self.vault.balance(Holder::EpochPool(epoch_id), token);
        if amount > Decimal::ZERO {
            self.vault.transfer(
                Holder::EpochPool(epoch_id),
                Holder::Player(recipient),
                token,
                amount,
            )?;
        }
        self.audit.record(
            AuditKind::SweepExecuted,
            Some(epoch_id),
            None,
            format!("pool remainder sweep: {amount} {token} to {recipient}"),
        );
        Ok(amount)
    }

    // =====================================================================
    // Funding and match lifecycle
    // =====================================================================

    /// Credit external funds to a player's balance. MatchSource only.
    pub fn fund_account(
        &mut self,
        caller: AccountId,
        account: AccountId,
        token: &str,
        amount: Decimal,
    ) -> Result<()> {
        self.roles.ensure(caller, Role::MatchSource)?;
        self.vault
            .deposit_external(Holder::Player(account), token, amount)
    }

    /// Declare a new match inside an OPEN epoch. MatchSource only.
    pub fn declare_match(
        &mut self,
        caller: AccountId,
        match_id: MatchId,
        legs: [MatchLeg; 2],
        epoch_id: EpochId,
    ) -> Result<()> {
        self.roles.ensure(caller, Role::MatchSource)?;
        let _entry = self.guard.enter(ResourceKey::Match(match_id))?;
        self.matches.declare(&self.ledger, match_id, legs, epoch_id)
    }

    /// Move a player's stake into match escrow. MatchSource only.
    pub fn deposit_stake(
        &mut self,
        caller: AccountId,
        match_id: MatchId,
        player: AccountId,
    ) -> Result<()> {
        self.roles.ensure(caller, Role::MatchSource)?;
        let _entry = self.guard.enter(ResourceKey::Match(match_id))?;
        self.matches.deposit_stake(&mut self.vault, match_id, player)
    }

    /// Resolve an ACTIVE match in favor of `winner`. MatchSource only.
    ///
    /// Holds both the match lock and the owning epoch's lock for the
    /// duration, since resolution feeds the epoch pool.
    pub fn resolve_match(
        &mut self,
        caller: AccountId,
        match_id: MatchId,
        winner: AccountId,
        hint: &RoutingHint,
    ) -> Result<ProceedsSplit> {
        self.roles.ensure(caller, Role::MatchSource)?;
        let epoch_id = self.matches.get(match_id)?.epoch_id;
        let _match_entry = self.guard.enter(ResourceKey::Match(match_id))?;
        let _epoch_entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;

        let split = self.matches.resolve(
            &mut self.vault,
            &mut self.registry,
            &mut self.ledger,
            &self.config,
            match_id,
            winner,
            hint,
        )?;
        self.audit.record(
            AuditKind::MatchResolved,
            Some(epoch_id),
            Some(match_id),
            format!(
                "winner {winner}: share {}, fee {}, pooled {}",
                split.winner_share, split.protocol_fee, split.pool_share
            ),
        );
        Ok(split)
    }

    /// Refund a live match. MatchSource only.
    pub fn refund_match(&mut self, caller: AccountId, match_id: MatchId) -> Result<()> {
        self.roles.ensure(caller, Role::MatchSource)?;
        let _entry = self.guard.enter(ResourceKey::Match(match_id))?;
        self.matches.refund(&mut self.vault, match_id)?;
        let epoch_id = self.matches.get(match_id)?.epoch_id;
        self.audit.record(
            AuditKind::MatchRefunded,
            Some(epoch_id),
            Some(match_id),
            "stakes returned",
        );
        Ok(())
    }

    // =====================================================================
    // Epoch control and settlement
    // =====================================================================

    /// Open a new epoch over `eligible_tokens`. EpochController only.
    pub fn open_epoch(&mut self, caller: AccountId, eligible_tokens: &[Token]) -> Result<EpochId> {
        self.roles.ensure(caller, Role::EpochController)?;
        self.ledger.open(eligible_tokens)
    }

    /// Close an OPEN epoch. EpochController only.
    pub fn close_epoch(&mut self, caller: AccountId, epoch_id: EpochId) -> Result<()> {
        self.roles.ensure(caller, Role::EpochController)?;
        let _entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;
        self.ledger.close(epoch_id)
    }

    /// Settlement phase 1. EpochController only.
    pub fn initialize_settlement(
        &mut self,
        caller: AccountId,
        epoch_id: EpochId,
        settlement_token: &str,
    ) -> Result<()> {
        self.roles.ensure(caller, Role::EpochController)?;
        let _entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;
        self.pipeline
            .initialize(&mut self.ledger, epoch_id, settlement_token)
    }

    /// Settlement phase 2: examine up to `limit` matches. EpochController
    /// only. Returns how many were examined.
    pub fn accumulate_matches(
        &mut self,
        caller: AccountId,
        epoch_id: EpochId,
        limit: usize,
    ) -> Result<usize> {
        self.roles.ensure(caller, Role::EpochController)?;
        let _entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;
        self.pipeline
            .accumulate_matches(&self.matches, epoch_id, limit)
    }

    /// Settlement phase 3: convert the pooled fund. EpochController only.
    pub fn convert_pool(
        &mut self,
        caller: AccountId,
        epoch_id: EpochId,
        hint: &RoutingHint,
    ) -> Result<ConversionReport> {
        self.roles.ensure(caller, Role::EpochController)?;
        let _entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;
        let report = self.pipeline.convert_pool(
            &self.ledger,
            &self.matches,
            &mut self.vault,
            &mut self.registry,
            &mut self.failed,
            epoch_id,
            hint,
        )?;
        for token in &report.failed_tokens {
            self.audit.record(
                AuditKind::ConversionFailureRecorded,
                Some(epoch_id),
                None,
                format!("{token} pool ledgered for recovery"),
            );
        }
        self.audit.record(
            AuditKind::PoolConverted,
            Some(epoch_id),
            None,
            format!(
                "pool balance {} ({} tokens converted, {} failed)",
                report.pool_balance,
                report.converted_tokens,
                report.failed_tokens.len()
            ),
        );
        Ok(report)
    }

    /// Settlement phase 4: pay up to `limit` participants. EpochController
    /// only.
    pub fn distribute_payouts(
        &mut self,
        caller: AccountId,
        epoch_id: EpochId,
        limit: usize,
    ) -> Result<Vec<Payout>> {
        self.roles.ensure(caller, Role::EpochController)?;
        let _entry = self.guard.enter(ResourceKey::Epoch(epoch_id))?;
        let payouts =
            self.pipeline
                .distribute_payouts(&mut self.ledger, &mut self.vault, epoch_id, limit)?;
        for payout in &payouts {
            self.audit.record(
                AuditKind::PayoutIssued,
                Some(epoch_id),
                None,
                format!("{} to {}", payout.amount, payout.account),
            );
        }
        if self
            .pipeline
            .progress(epoch_id)
            .is_some_and(|p| p.fully_paid)
        {
            self.audit.record(
                AuditKind::EpochSettled,
                Some(epoch_id),
                None,
                "distribution complete",
            );
        }
        Ok(payouts)
    }

    // =====================================================================
    // Read-only surface
    // =====================================================================

    /// Immutable match record (the external match-data query).
    pub fn match_record(&self, match_id: MatchId) -> Result<&WagerMatch> {
        self.matches.get(match_id)
    }

    /// Epoch lookup.
    pub fn epoch(&self, epoch_id: EpochId) -> Result<&Epoch> {
        self.ledger.epoch(epoch_id)
    }

    /// A player's free balance.
    #[must_use]
    pub fn player_balance(&self, account: AccountId, token: &str) -> Decimal {
        self.vault.balance(Holder::Player(account), token)
    }

    /// Accumulated protocol fee revenue.
    #[must_use]
    pub fn treasury_balance(&self, token: &str) -> Decimal {
        self.vault.balance(Holder::Treasury, token)
    }

    /// An epoch pool's current holding of one token.
    #[must_use]
    pub fn epoch_pool_balance(&self, epoch_id: EpochId, token: &str) -> Decimal {
        self.vault.balance(Holder::EpochPool(epoch_id), token)
    }

    /// Pooled deposit total recorded for one (epoch, token).
    #[must_use]
    pub fn pooled_deposits(&self, epoch_id: EpochId, token: &str) -> Decimal {
        self.ledger.deposits(epoch_id, token)
    }

    /// Settlement progress, if initialized.
    #[must_use]
    pub fn progress(&self, epoch_id: EpochId) -> Option<&SettlementProgress> {
        self.pipeline.progress(epoch_id)
    }

    /// Failed-conversion ledger balance for one token.
    #[must_use]
    pub fn failed_balance(&self, token: &str) -> Decimal {
        self.failed.balance(token)
    }

    /// The audit trail.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Verify the vault conservation invariant across every token.
    pub fn verify_conservation(&self) -> Result<()> {
        self.vault.verify_all()
    }
}
