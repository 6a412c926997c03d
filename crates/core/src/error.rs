// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock acquisition and release

use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while acquiring a lock
///
/// `Timeout` is raised only by the bounded [`lock_for`] convenience;
/// the `try_lock` variants report the same condition as `Ok(false)`.
///
/// [`lock_for`]: crate::lock::Lock::lock_for
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock name must not be empty")]
    InvalidName,
    #[error("lock '{name}' is already held by the current thread")]
    Reentrant { name: String },
    #[error("acquisition of lock '{name}' was cancelled")]
    Cancelled { name: String },
    #[error("failed to acquire lock '{name}' within {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while releasing a lock
#[derive(Debug, Error)]
pub enum UnlockError {
    #[error("lock '{name}' is not held by the current thread")]
    NotHeld { name: String },
    #[error("lease for lock '{name}' is no longer owned by this holder")]
    LeaseLost { name: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
