//! Capability-gated authorization.
//!
//! Every mutating entry point names exactly one required [`Role`] and
//! checks it through the injected [`AccessGate`] capability, so the match
//! book, epoch ledger, and settlement pipeline share one authorization
//! abstraction without coupling to a particular role store.
//!
//! Role bootstrapping and transfer policy live outside this system; the
//! in-memory [`RoleBook`] is the concrete grant-set implementation.

use std::collections::{HashMap, HashSet};

use openparlay_types::{AccountId, OpenparlayError, Result, Role};

/// Authorization capability checked by every mutating operation.
pub trait AccessGate {
    /// `Ok(())` iff `caller` holds `role`; otherwise an authorization
    /// error with no state change anywhere.
    fn ensure(&self, caller: AccountId, role: Role) -> Result<()>;
}

/// In-memory role grant set.
#[derive(Debug, Default)]
pub struct RoleBook {
    grants: HashMap<Role, HashSet<AccountId>>,
}

impl RoleBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a book with an initial administrator.
    #[must_use]
    pub fn with_admin(admin: AccountId) -> Self {
        let mut book = Self::new();
        book.grant(admin, Role::Administrator);
        book
    }

    /// Grant `role` to `account`. Idempotent.
    pub fn grant(&mut self, account: AccountId, role: Role) {
        self.grants.entry(role).or_default().insert(account);
    }

    /// Revoke `role` from `account`. Returns whether it was held.
    pub fn revoke(&mut self, account: AccountId, role: Role) -> bool {
        self.grants
            .get_mut(&role)
            .is_some_and(|holders| holders.remove(&account))
    }

    /// Whether `account` holds `role`.
    #[must_use]
    pub fn holds(&self, account: AccountId, role: Role) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|holders| holders.contains(&account))
    }

    /// Number of holders of `role`.
    #[must_use]
    pub fn holder_count(&self, role: Role) -> usize {
        self.grants.get(&role).map_or(0, HashSet::len)
    }
}

impl AccessGate for RoleBook {
    fn ensure(&self, caller: AccountId, role: Role) -> Result<()> {
        if self.holds(caller, role) {
            Ok(())
        } else {
            Err(OpenparlayError::Unauthorized { caller, role })
        }
    }
}
