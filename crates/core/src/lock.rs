// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locker state machine for exclusive resource access
//!
//! A lock arbitrates two layers of exclusivity: a local holder marker
//! (one compare-and-swap winner among threads of this process) and a
//! remote lease (one winner among processes, decided by the store's
//! atomic set-if-absent). The local claim is always rolled back when
//! the remote claim fails, so no Locker is ever left stuck Held without
//! a matching lease.
//!
//! Locks are not reentrant: any acquire call from the thread that
//! already holds the lock is a [`LockError::Reentrant`] fault.

use crate::error::{LockError, UnlockError};
use crate::guard::LockGuard;
use crate::owner::OwnerId;
use crate::store::LockStore;
use crate::token::{RandomMinter, Token, TokenMinter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Granularity of local and remote acquisition polling
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-attempt timeout used by the unbounded [`Lock::lock`] loop
const LOCK_SEGMENT: Duration = Duration::from_secs(60);

/// Outcome of a local holder-marker compare-and-swap
enum LocalClaim {
    Acquired,
    HeldBySelf,
    HeldByOther,
}

struct LockInner<S, M> {
    /// Effective (prefixed, suffixed) name; doubles as the remote key
    name: String,
    /// Owner marker of the holding thread, 0 when free
    holder: AtomicU64,
    /// Token proving remote ownership; valid only while held
    token: Mutex<Option<Token>>,
    store: Arc<S>,
    minter: M,
    lease: Duration,
    /// Set by the manager on shutdown; pollers fail with `Cancelled`
    shutdown: Arc<AtomicBool>,
}

/// A named distributed lock
///
/// Cheap to clone; all clones refer to the same Locker instance. The
/// manager's registry guarantees one instance per effective name.
pub struct Lock<S: LockStore, M: TokenMinter = RandomMinter> {
    inner: Arc<LockInner<S, M>>,
}

impl<S: LockStore, M: TokenMinter> Clone for Lock<S, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: LockStore, M: TokenMinter> std::fmt::Debug for Lock<S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("name", &self.inner.name)
            .field("holder", &self.inner.holder.load(Ordering::Acquire))
            .finish()
    }
}

impl<S: LockStore, M: TokenMinter> Lock<S, M> {
    pub(crate) fn new(
        name: String,
        store: Arc<S>,
        minter: M,
        lease: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            inner: Arc::new(LockInner {
                name,
                holder: AtomicU64::new(0),
                token: Mutex::new(None),
                store,
                minter,
                lease,
                shutdown,
            }),
        }
    }

    /// Effective name of this lock (also its remote key)
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the calling thread is the local holder
    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner.holder.load(Ordering::Acquire) == OwnerId::current().marker()
    }

    /// Attempt to acquire without blocking
    ///
    /// Returns `Ok(false)` when another thread or process holds the
    /// lock. Calling this from the thread that already holds the lock
    /// is a [`LockError::Reentrant`] fault.
    pub fn try_lock(&self) -> Result<bool, LockError> {
        match self.claim_local() {
            LocalClaim::HeldBySelf => Err(self.reentrant()),
            LocalClaim::HeldByOther => Ok(false),
            LocalClaim::Acquired => self.acquire_remote_once(),
        }
    }

    /// Attempt to acquire, polling until `timeout` elapses
    ///
    /// Two phases, both polled at [`POLL_INTERVAL`]: first local
    /// exclusivity among threads, then the remote lease among
    /// processes. Returns `Ok(false)` on timeout; manager shutdown
    /// during either phase is a [`LockError::Cancelled`] fault. Either
    /// way the local holder marker is rolled back to free.
    pub fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError> {
        let deadline = Instant::now() + timeout;

        // Phase 1: local contention
        loop {
            match self.claim_local() {
                LocalClaim::Acquired => break,
                LocalClaim::HeldBySelf => return Err(self.reentrant()),
                LocalClaim::HeldByOther => {
                    if self.is_cancelled() {
                        return Err(self.cancelled());
                    }
                    if Instant::now() >= deadline {
                        debug!(name = self.name(), timeout_ms = timeout.as_millis() as u64, "local acquisition timed out");
                        return Ok(false);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }

        // Phase 2: remote contention
        let token = self.inner.minter.mint();
        self.set_token(Some(token.clone()));
        loop {
            match self
                .inner
                .store
                .acquire(self.name(), token.as_str(), self.inner.lease)
            {
                Ok(true) => {
                    debug!(name = self.name(), "lock acquired");
                    return Ok(true);
                }
                Ok(false) => {
                    if self.is_cancelled() {
                        self.rollback_local();
                        return Err(self.cancelled());
                    }
                    if Instant::now() >= deadline {
                        debug!(name = self.name(), timeout_ms = timeout.as_millis() as u64, "remote acquisition timed out");
                        self.rollback_local();
                        return Ok(false);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    self.rollback_local();
                    error!(name = self.name(), error = %e, "failed to acquire lock");
                    return Err(e.into());
                }
            }
        }
    }

    /// Acquire, blocking the calling thread until the lock is granted
    ///
    /// Retries in [`LOCK_SEGMENT`]-long attempts indefinitely; may
    /// block for an unbounded duration. The returned guard releases the
    /// lock when dropped.
    pub fn lock(&self) -> Result<LockGuard<S, M>, LockError> {
        loop {
            if self.try_lock_for(LOCK_SEGMENT)? {
                return Ok(LockGuard::new(self.clone()));
            }
        }
    }

    /// Acquire within `timeout`, or fail with [`LockError::Timeout`]
    pub fn lock_for(&self, timeout: Duration) -> Result<LockGuard<S, M>, LockError> {
        if self.try_lock_for(timeout)? {
            Ok(LockGuard::new(self.clone()))
        } else {
            Err(LockError::Timeout {
                name: self.name().to_string(),
                timeout,
            })
        }
    }

    /// Release the lock held by the calling thread
    ///
    /// The local holder marker is reset even when the store denies the
    /// release: a denial means the lease already expired or was taken
    /// over, and a marker with no lease behind it would wedge this name
    /// for the rest of the process lifetime.
    pub fn unlock(&self) -> Result<(), UnlockError> {
        if !self.is_held_by_current_thread() {
            error!(name = self.name(), "unlock attempted by a thread that does not hold the lock");
            return Err(UnlockError::NotHeld {
                name: self.name().to_string(),
            });
        }

        let released = match self.take_token() {
            Some(token) => self.inner.store.release(self.name(), token.as_str()),
            // Held locally with no token recorded: nothing provable remotely
            None => Ok(false),
        };
        self.release_local();

        match released {
            Ok(true) => {
                debug!(name = self.name(), "lock released");
                Ok(())
            }
            Ok(false) => {
                error!(name = self.name(), "lease expired or was taken over before release");
                Err(UnlockError::LeaseLost {
                    name: self.name().to_string(),
                })
            }
            Err(e) => {
                error!(name = self.name(), error = %e, "failed to release lock");
                Err(e.into())
            }
        }
    }

    /// Try to acquire and run exactly one of the callbacks
    ///
    /// `on_success` runs while the lock is held and the lock is always
    /// released afterwards, even if the callback panics. Callback
    /// panics and release failures are logged, never propagated; only
    /// acquisition faults reach the caller.
    pub fn try_lock_with<A, B>(&self, on_success: A, on_failure: B) -> Result<(), LockError>
    where
        A: FnOnce(),
        B: FnOnce(),
    {
        let acquired = self.try_lock()?;
        self.run_callbacks(acquired, on_success, on_failure);
        Ok(())
    }

    /// Like [`try_lock_with`](Self::try_lock_with), polling for up to `timeout`
    pub fn try_lock_with_for<A, B>(
        &self,
        timeout: Duration,
        on_success: A,
        on_failure: B,
    ) -> Result<(), LockError>
    where
        A: FnOnce(),
        B: FnOnce(),
    {
        let acquired = self.try_lock_for(timeout)?;
        self.run_callbacks(acquired, on_success, on_failure);
        Ok(())
    }

    // === internals ===

    fn acquire_remote_once(&self) -> Result<bool, LockError> {
        let token = self.inner.minter.mint();
        self.set_token(Some(token.clone()));
        match self
            .inner
            .store
            .acquire(self.name(), token.as_str(), self.inner.lease)
        {
            Ok(true) => {
                debug!(name = self.name(), "lock acquired");
                Ok(true)
            }
            Ok(false) => {
                self.rollback_local();
                Ok(false)
            }
            Err(e) => {
                self.rollback_local();
                error!(name = self.name(), error = %e, "failed to acquire lock");
                Err(e.into())
            }
        }
    }

    fn run_callbacks<A, B>(&self, acquired: bool, on_success: A, on_failure: B)
    where
        A: FnOnce(),
        B: FnOnce(),
    {
        if acquired {
            if catch_unwind(AssertUnwindSafe(on_success)).is_err() {
                error!(name = self.name(), "acquire-success callback panicked");
            }
            if let Err(e) = self.unlock() {
                error!(name = self.name(), error = %e, "failed to release lock after callback");
            }
        } else if catch_unwind(AssertUnwindSafe(on_failure)).is_err() {
            error!(name = self.name(), "acquire-failure callback panicked");
        }
    }

    fn claim_local(&self) -> LocalClaim {
        let me = OwnerId::current().marker();
        match self
            .inner
            .holder
            .compare_exchange(0, me, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => LocalClaim::Acquired,
            Err(current) if current == me => LocalClaim::HeldBySelf,
            Err(_) => LocalClaim::HeldByOther,
        }
    }

    fn release_local(&self) {
        self.inner.holder.store(0, Ordering::Release);
    }

    fn rollback_local(&self) {
        self.set_token(None);
        self.release_local();
    }

    fn set_token(&self, token: Option<Token>) {
        *self.inner.token.lock().unwrap_or_else(|e| e.into_inner()) = token;
    }

    fn take_token(&self) -> Option<Token> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    fn is_cancelled(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    fn reentrant(&self) -> LockError {
        LockError::Reentrant {
            name: self.name().to_string(),
        }
    }

    fn cancelled(&self) -> LockError {
        LockError::Cancelled {
            name: self.name().to_string(),
        }
    }

    // === renewal-daemon interface ===

    /// Whether any thread currently holds the local marker
    pub(crate) fn is_held(&self) -> bool {
        self.inner.holder.load(Ordering::Acquire) != 0
    }

    /// Current ownership token, if held
    pub(crate) fn current_token(&self) -> Option<Token> {
        self.inner
            .token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn store(&self) -> &S {
        &self.inner.store
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
