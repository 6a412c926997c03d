// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped lock release
//!
//! [`Lock::lock`](crate::lock::Lock::lock) and
//! [`Lock::lock_for`](crate::lock::Lock::lock_for) hand ownership to a
//! guard whose only job is deterministic release: the lock is unlocked
//! exactly once, on any exit path.

use crate::error::UnlockError;
use crate::lock::Lock;
use crate::store::LockStore;
use crate::token::TokenMinter;
use std::marker::PhantomData;
use tracing::error;

/// Releases the held lock when dropped
///
/// Release must happen on the acquiring thread, so the guard is
/// deliberately not `Send`.
pub struct LockGuard<S: LockStore, M: TokenMinter> {
    lock: Lock<S, M>,
    released: bool,
    // NOTE(send): keeps the guard on the thread that acquired the lock
    _not_send: PhantomData<*const ()>,
}

impl<S: LockStore, M: TokenMinter> std::fmt::Debug for LockGuard<S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("lock", &self.lock)
            .field("released", &self.released)
            .finish()
    }
}

impl<S: LockStore, M: TokenMinter> LockGuard<S, M> {
    pub(crate) fn new(lock: Lock<S, M>) -> Self {
        Self {
            lock,
            released: false,
            _not_send: PhantomData,
        }
    }

    /// The lock this guard releases
    pub fn lock(&self) -> &Lock<S, M> {
        &self.lock
    }

    /// Release now, observing any unlock fault
    ///
    /// Dropping the guard releases too, but reports failures only to
    /// the log.
    pub fn unlock(mut self) -> Result<(), UnlockError> {
        self.released = true;
        self.lock.unlock()
    }
}

impl<S: LockStore, M: TokenMinter> Drop for LockGuard<S, M> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.lock.unlock() {
            error!(name = self.lock.name(), error = %e, "failed to release lock on scope exit");
        }
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
