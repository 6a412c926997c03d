// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock registry and manager
//!
//! The manager owns the name→Locker registry and the renewal daemon.
//! Entries are created lazily on first [`acquire`](LockManager::acquire)
//! and live for the manager's lifetime; only
//! [`force_unlock`](LockManager::force_unlock) removes one.

use crate::config::LockSettings;
use crate::error::LockError;
use crate::lock::Lock;
use crate::renewal::RenewalTask;
use crate::store::{LockStore, StoreError};
use crate::token::{RandomMinter, TokenMinter};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

/// Snapshot of registry occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Registered Lockers
    pub locks: usize,
    /// Lockers currently held by some thread
    pub held: usize,
}

/// Manages the singleton Locker per name and renews held leases
///
/// Construction starts exactly one renewal daemon thread; dropping the
/// manager signals it to stop, cancels any waiting acquisitions and
/// joins the thread.
pub struct LockManager<S: LockStore, M: TokenMinter = RandomMinter> {
    registry: Arc<DashMap<String, Lock<S, M>>>,
    store: Arc<S>,
    minter: M,
    prefix: String,
    lease: Duration,
    shutdown: Arc<AtomicBool>,
    renew_stop: Option<mpsc::Sender<()>>,
    renew_handle: Option<JoinHandle<()>>,
}

impl<S: LockStore> LockManager<S> {
    /// Create a manager minting random UUID tokens
    pub fn new(settings: LockSettings, store: S) -> std::io::Result<Self> {
        Self::with_minter(settings, store, RandomMinter)
    }
}

impl<S: LockStore, M: TokenMinter> LockManager<S, M> {
    /// Create a manager with a caller-supplied token minter
    pub fn with_minter(settings: LockSettings, store: S, minter: M) -> std::io::Result<Self> {
        let lease = settings.clamped_lease();
        let store = Arc::new(store);
        let registry: Arc<DashMap<String, Lock<S, M>>> = Arc::new(DashMap::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        info!(
            prefix = settings.prefix.as_str(),
            lease_ms = lease.as_millis() as u64,
            "lock manager started"
        );

        let task = RenewalTask::new(
            Arc::clone(&registry),
            lease,
            lease / 3,
            settings.monitor.enabled,
        );
        let (renew_stop, renew_handle) = task.spawn()?;

        Ok(Self {
            registry,
            store,
            minter,
            prefix: settings.prefix,
            lease,
            shutdown,
            renew_stop: Some(renew_stop),
            renew_handle: Some(renew_handle),
        })
    }

    /// The Locker bound to `name`, created on first use
    ///
    /// Concurrent callers asking for the same name always receive the
    /// same instance.
    pub fn acquire(&self, name: &str) -> Result<Lock<S, M>, LockError> {
        if name.is_empty() {
            return Err(LockError::InvalidName);
        }
        let effective = self.effective_name(name);
        let entry = self.registry.entry(effective.clone()).or_insert_with(|| {
            Lock::new(
                effective,
                Arc::clone(&self.store),
                self.minter.clone(),
                self.lease,
                Arc::clone(&self.shutdown),
            )
        });
        Ok(entry.value().clone())
    }

    /// Remove the lock's registry entry and delete its remote key,
    /// bypassing the token check
    ///
    /// This does not coordinate with the current holder: a thread that
    /// believes it still holds the lock will fail its `unlock` with an
    /// unlock fault. Use only for operator-driven recovery after a
    /// detected store inconsistency, never in normal control flow.
    pub fn force_unlock(&self, lock: &Lock<S, M>) -> Result<(), StoreError> {
        warn!(
            name = lock.name(),
            "force-unlocking; any current holder will fail its unlock"
        );
        self.registry.remove(lock.name());
        self.store.remove(lock.name())
    }

    /// Lease granted to every lock of this manager (floor-clamped)
    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Registry occupancy snapshot
    pub fn stats(&self) -> ManagerStats {
        let held = self
            .registry
            .iter()
            .filter(|entry| entry.value().is_held())
            .count();
        ManagerStats {
            locks: self.registry.len(),
            held,
        }
    }

    fn effective_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            format!("{name}.lock")
        } else {
            format!("{}.{}.lock", self.prefix, name)
        }
    }
}

impl<S: LockStore, M: TokenMinter> Drop for LockManager<S, M> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        // Disconnecting the channel wakes the daemon's timed sleep
        drop(self.renew_stop.take());
        if let Some(handle) = self.renew_handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
