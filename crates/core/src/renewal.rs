// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background lease renewal
//!
//! One daemon thread per manager walks the registry every
//! lease-duration/3 and refreshes the lease of every Locker that is
//! currently held, so holders never renew manually. A fault renewing
//! one Locker never interrupts the others or the loop.

use crate::lock::Lock;
use crate::store::LockStore;
use crate::token::TokenMinter;
use dashmap::DashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome counts of one renewal cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CycleStats {
    pub renewed: usize,
    pub lost: usize,
    pub failed: usize,
}

/// The manager's renewal daemon
pub(crate) struct RenewalTask<S: LockStore, M: TokenMinter> {
    registry: Arc<DashMap<String, Lock<S, M>>>,
    lease: Duration,
    interval: Duration,
    monitor: bool,
}

impl<S: LockStore, M: TokenMinter> RenewalTask<S, M> {
    pub(crate) fn new(
        registry: Arc<DashMap<String, Lock<S, M>>>,
        lease: Duration,
        interval: Duration,
        monitor: bool,
    ) -> Self {
        Self {
            registry,
            lease,
            interval,
            monitor,
        }
    }

    /// Start the daemon thread; dropping the returned sender stops it
    pub(crate) fn spawn(self) -> std::io::Result<(Sender<()>, JoinHandle<()>)> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("keylease-renew".to_string())
            .spawn(move || self.run(stop_rx))?;
        Ok((stop_tx, handle))
    }

    fn run(self, stop: Receiver<()>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "renewal task started"
        );
        loop {
            // Timed sleep doubling as the stop signal
            match stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("renewal task stopping");
                    return;
                }
            }
            if self.registry.is_empty() {
                continue;
            }
            let stats = renew_cycle(&self.registry, self.lease);
            if self.monitor {
                debug!(
                    renewed = stats.renewed,
                    lost = stats.lost,
                    failed = stats.failed,
                    "renewal cycle complete"
                );
            }
        }
    }
}

/// Refresh the lease of every currently held Locker
pub(crate) fn renew_cycle<S: LockStore, M: TokenMinter>(
    registry: &DashMap<String, Lock<S, M>>,
    lease: Duration,
) -> CycleStats {
    let mut stats = CycleStats::default();
    for entry in registry.iter() {
        let lock = entry.value();
        if !lock.is_held() {
            continue;
        }
        let Some(token) = lock.current_token() else {
            continue;
        };
        match lock.store().renew(lock.name(), token.as_str(), lease) {
            Ok(true) => {
                stats.renewed += 1;
                debug!(name = lock.name(), "lease renewed");
            }
            Ok(false) => {
                stats.lost += 1;
                warn!(name = lock.name(), "lease no longer owned, renewal skipped");
            }
            Err(e) => {
                stats.failed += 1;
                error!(name = lock.name(), error = %e, "failed to renew lease");
            }
        }
    }
    stats
}

#[cfg(test)]
#[path = "renewal_tests.rs"]
mod tests;
