// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership tokens
//!
//! A lease is only as strong as the proof of who wrote it. Every
//! acquisition attempt mints a fresh [`Token`] and stores it as the
//! remote key's value; release and renewal present the token again and
//! the store acts only when the stored value matches. A process whose
//! lease expired or was taken over therefore can never delete or
//! extend the current holder's lease.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Proof of lease ownership, opaque to everything but the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Mint an unguessable token
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wire form, written as the remote key's value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token source a Locker draws from on each acquisition attempt
pub trait TokenMinter: Clone + Send + Sync + 'static {
    fn mint(&self) -> Token;
}

/// Production minter: random UUID tokens
#[derive(Clone, Copy, Default)]
pub struct RandomMinter;

impl TokenMinter for RandomMinter {
    fn mint(&self) -> Token {
        Token::random()
    }
}

/// Deterministic minter for tests: `label-1`, `label-2`, ...
///
/// Clones share the counter, so tokens stay unique across every handle
/// minting under the same label.
#[derive(Clone)]
pub struct CountingMinter {
    label: String,
    counter: Arc<AtomicU64>,
}

impl CountingMinter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl TokenMinter for CountingMinter {
    fn mint(&self) -> Token {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Token(format!("{}-{}", self.label, n))
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
