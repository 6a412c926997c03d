// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease time source
//!
//! Every time question in this crate is a lease-deadline question: a
//! key expires at the instant computed by [`Clock::deadline_after`]
//! when the lease is granted or renewed. Routing that computation
//! through a trait lets tests move time past a deadline instead of
//! sleeping up to it.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Instant;

    /// Expiry instant of a lease granted at this moment
    fn deadline_after(&self, lease: Duration) -> Instant {
        self.now() + lease
    }
}

/// Wall time
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Test clock: a fixed epoch plus a shared, manually advanced offset
///
/// Leases granted against a `FakeClock` expire only when a test calls
/// [`advance`](FakeClock::advance) past their deadline. The offset is
/// shared by all clones, so the store under test and the test driving
/// it always agree on the time.
#[derive(Clone)]
pub struct FakeClock {
    epoch: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Jump time forward, expiring any deadline the jump passes
    pub fn advance(&self, duration: Duration) {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner()) += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.epoch + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
