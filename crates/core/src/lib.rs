// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Named distributed locks with leased ownership
//!
//! A [`LockManager`] hands out one [`Lock`] per name. Each lock layers
//! local thread exclusivity (a compare-and-swap holder marker) over a
//! remote lease written through a [`LockStore`], and a per-manager
//! daemon renews held leases in the background. Guards from
//! [`Lock::lock`] release on drop; [`Lock::try_lock_with`] wraps an
//! acquire-run-release sequence around a callback.
//!
//! [`MemoryStore`] is a single-process store for tests and local use;
//! process-spanning backends implement [`LockStore`] in companion
//! crates.

mod clock;
mod config;
mod error;
mod guard;
mod lock;
mod manager;
mod owner;
mod renewal;
mod store;
mod token;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{LockSettings, MonitorSettings, MIN_LEASE};
pub use error::{LockError, UnlockError};
pub use guard::LockGuard;
pub use lock::{Lock, POLL_INTERVAL};
pub use manager::{LockManager, ManagerStats};
pub use owner::OwnerId;
pub use store::{LockStore, MemoryStore, StoreError};
pub use token::{CountingMinter, RandomMinter, Token, TokenMinter};
