// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-thread owner identity for local lock arbitration
//!
//! Each thread is lazily assigned a process-unique non-zero id. The
//! Locker's holder marker stores this id in an `AtomicU64`, with 0
//! meaning "free", so local exclusivity is a single compare-and-swap.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_OWNER: NonZeroU64 = {
        let raw = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and only increments, so this is never zero.
        NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN)
    };
}

/// Identity of the logical owner of a lock: the calling thread
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(NonZeroU64);

impl OwnerId {
    /// Identity of the calling thread, assigned on first use
    pub fn current() -> Self {
        CURRENT_OWNER.with(|id| Self(*id))
    }

    /// Raw marker value stored in a holder slot
    pub(crate) fn marker(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "owner_tests.rs"]
mod tests;
