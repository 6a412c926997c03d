// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote store contract and in-memory implementation
//!
//! The store arbitrates cross-process exclusivity through three atomic
//! operations: set-if-absent-with-expiry, compare-token-then-delete and
//! compare-token-then-refresh-expiry. `remove` is the unconditional
//! delete behind the manager's force-unlock escape hatch.
//!
//! `MemoryStore` is the in-process implementation used by tests and
//! single-process deployments; clones share state, so two managers
//! holding clones model two processes sharing one remote store.

use crate::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {message}")]
    Backend { message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Atomic lease operations against a shared key-value store
///
/// Every operation must be atomic from the store's perspective: no
/// other operation may observe or act on `key` between the check and
/// the mutation.
pub trait LockStore: Send + Sync + 'static {
    /// Set `key = token` with the given expiry, only if `key` is absent.
    /// Returns whether the set happened.
    fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError>;

    /// Delete `key`, only if its current value equals `token`.
    /// Returns whether the delete happened.
    fn release(&self, key: &str, token: &str) -> Result<bool, StoreError>;

    /// Reset `key`'s expiry, only if its current value equals `token`.
    /// Returns whether the refresh happened.
    fn renew(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError>;

    /// Delete `key` unconditionally, bypassing the token check.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A leased entry: token value plus expiry deadline
#[derive(Clone, Debug)]
struct Lease {
    token: String,
    deadline: Instant,
}

#[derive(Default)]
struct MemoryState {
    leases: HashMap<String, Lease>,
    // Configurable failure modes
    fail_acquires: bool,
    fail_releases: bool,
    fail_renews: bool,
}

/// In-memory lease store with clock-driven expiry
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock> {
    state: Arc<Mutex<MemoryState>>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            clock,
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drop the entry for `key` if its lease has already expired
    fn evict_expired(state: &mut MemoryState, key: &str, now: Instant) {
        if let Some(lease) = state.leases.get(key) {
            if now >= lease.deadline {
                state.leases.remove(key);
            }
        }
    }

    /// Current token stored for `key`, if the lease is live
    pub fn value_of(&self, key: &str) -> Option<String> {
        let mut state = self.lock_state();
        Self::evict_expired(&mut state, key, self.clock.now());
        state.leases.get(key).map(|l| l.token.clone())
    }

    /// Remaining lease time for `key`, if the lease is live
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let mut state = self.lock_state();
        let now = self.clock.now();
        Self::evict_expired(&mut state, key, now);
        state
            .leases
            .get(key)
            .map(|l| l.deadline.saturating_duration_since(now))
    }

    /// Number of live leases
    pub fn len(&self) -> usize {
        let mut state = self.lock_state();
        let now = self.clock.now();
        state.leases.retain(|_, l| now < l.deadline);
        state.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make subsequent acquire calls fail with a backend error
    pub fn fail_acquires(&self, fail: bool) {
        self.lock_state().fail_acquires = fail;
    }

    /// Make subsequent release calls fail with a backend error
    pub fn fail_releases(&self, fail: bool) {
        self.lock_state().fail_releases = fail;
    }

    /// Make subsequent renew calls fail with a backend error
    pub fn fail_renews(&self, fail: bool) {
        self.lock_state().fail_renews = fail;
    }
}

impl<C: Clock + 'static> LockStore for MemoryStore<C> {
    fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let mut state = self.lock_state();
        if state.fail_acquires {
            return Err(StoreError::backend("injected acquire failure"));
        }
        let now = self.clock.now();
        Self::evict_expired(&mut state, key, now);
        if state.leases.contains_key(key) {
            return Ok(false);
        }
        state.leases.insert(
            key.to_string(),
            Lease {
                token: token.to_string(),
                deadline: self.clock.deadline_after(lease),
            },
        );
        Ok(true)
    }

    fn release(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let mut state = self.lock_state();
        if state.fail_releases {
            return Err(StoreError::backend("injected release failure"));
        }
        let now = self.clock.now();
        Self::evict_expired(&mut state, key, now);
        match state.leases.get(key) {
            Some(lease) if lease.token == token => {
                state.leases.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn renew(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let mut state = self.lock_state();
        if state.fail_renews {
            return Err(StoreError::backend("injected renew failure"));
        }
        let now = self.clock.now();
        Self::evict_expired(&mut state, key, now);
        match state.leases.get_mut(key) {
            Some(existing) if existing.token == token => {
                existing.deadline = self.clock.deadline_after(lease);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock_state().leases.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
