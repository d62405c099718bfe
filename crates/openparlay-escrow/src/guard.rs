//! Per-resource reentrancy guard.
//!
//! Conversion and payout steps invoke external capabilities that could,
//! in principle, call back into the engine before the original operation
//! finishes. Every mutating entry point therefore takes an exclusive
//! non-reentrant lock on the match or epoch it touches for the duration
//! of the operation: a nested acquisition of a held key fails immediately
//! instead of observing partially-updated state.
//!
//! The lock is an RAII scope guard — released on all exit paths, error
//! or success. There is no timeout and no queueing; the execution model
//! is strictly sequential, so a held key can only mean reentrancy.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use openparlay_types::{EpochId, MatchId, OpenparlayError, Result};

/// The lockable resources of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Match(MatchId),
    Epoch(EpochId),
    /// Treasury / failed-pool recovery operations.
    Recovery,
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match(id) => write!(f, "match:{id}"),
            Self::Epoch(id) => write!(f, "{id}"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

/// Exclusive per-resource lock set. Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    held: Rc<RefCell<HashSet<ResourceKey>>>,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire `key`, failing immediately if it is already held.
    pub fn enter(&self, key: ResourceKey) -> Result<EntryGuard> {
        if !self.held.borrow_mut().insert(key) {
            return Err(OpenparlayError::ReentrancyBlocked {
                resource: key.to_string(),
            });
        }
        Ok(EntryGuard {
            held: Rc::clone(&self.held),
            key,
        })
    }

    /// Whether `key` is currently held.
    #[must_use]
    pub fn is_held(&self, key: ResourceKey) -> bool {
        self.held.borrow().contains(&key)
    }
}

/// RAII scope guard: releases its key when dropped.
#[derive(Debug)]
pub struct EntryGuard {
    held: Rc<RefCell<HashSet<ResourceKey>>>,
    key: ResourceKey,
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        self.held.borrow_mut().remove(&self.key);
    }
}
