//! Adapter registry — unordered-pair lookup of conversion adapters.
//!
//! One adapter per token pair, set by an administrative operation.
//! Absence is a valid, checked state: conversion callers distinguish
//! "no adapter configured" (a validation error at match resolution, a
//! recorded failure during pool conversion) from adapter execution
//! failures.

use std::collections::HashMap;

use openparlay_types::{OpenparlayError, Result, TokenPair};

use crate::adapter::ConversionAdapter;

/// Maps unordered token pairs to their conversion adapter.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<TokenPair, Box<dyn ConversionAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) the adapter for `(a, b)`.
    pub fn set(&mut self, a: &str, b: &str, adapter: Box<dyn ConversionAdapter>) -> Result<()> {
        let pair = TokenPair::new(a, b).ok_or_else(|| {
            OpenparlayError::Configuration(format!("adapter pair must be two distinct tokens, got {a}/{b}"))
        })?;
        self.adapters.insert(pair, adapter);
        Ok(())
    }

    /// Remove the adapter for `(a, b)`. Returns whether one was present.
    pub fn clear(&mut self, a: &str, b: &str) -> bool {
        TokenPair::new(a, b).is_some_and(|pair| self.adapters.remove(&pair).is_some())
    }

    /// Whether an adapter is configured for `(a, b)`.
    #[must_use]
    pub fn configured(&self, a: &str, b: &str) -> bool {
        TokenPair::new(a, b).is_some_and(|pair| self.adapters.contains_key(&pair))
    }

    /// The adapter for `(a, b)`, or `AdapterNotConfigured`.
    pub fn route(&mut self, from: &str, to: &str) -> Result<&mut (dyn ConversionAdapter + 'static)> {
        let missing = || OpenparlayError::AdapterNotConfigured {
            from: from.to_string(),
            to: to.to_string(),
        };
        let pair = TokenPair::new(from, to).ok_or_else(missing)?;
        self.adapters
            .get_mut(&pair)
            .map(|adapter| adapter.as_mut())
            .ok_or_else(missing)
    }

    /// Number of configured pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
