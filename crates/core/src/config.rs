// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager configuration
//!
//! Read once at manager construction. The lease duration is clamped to
//! [`MIN_LEASE`] there, not here, so a settings struct always reports
//! what was configured.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest lease a manager will grant
pub const MIN_LEASE: Duration = Duration::from_secs(30);

/// Settings for a [`LockManager`](crate::manager::LockManager)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Prefix prepended to every lock name (default: none)
    pub prefix: String,
    /// Lease duration for every lock managed by this manager
    #[serde(with = "humantime_serde")]
    pub lease: Duration,
    /// Monitoring options
    pub monitor: MonitorSettings,
}

/// Monitoring options
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Log per-cycle renewal statistics
    pub enabled: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            lease: MIN_LEASE,
            monitor: MonitorSettings::default(),
        }
    }
}

impl LockSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_monitor(mut self, enabled: bool) -> Self {
        self.monitor.enabled = enabled;
        self
    }

    /// Parse settings from a TOML document
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// The configured lease, floor-clamped to [`MIN_LEASE`]
    pub fn clamped_lease(&self) -> Duration {
        self.lease.max(MIN_LEASE)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
