// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use keylease_core::{LockStore, StoreError};
use redis::Script;
use std::time::Duration;
use tracing::debug;

// Set-if-absent with TTL, in one server-side step
const ACQUIRE: &str = r#"
if redis.call('setnx', KEYS[1], ARGV[1]) == 1 then
    redis.call('pexpire', KEYS[1], ARGV[2])
    return 1
else
    return 0
end
"#;

// Delete only while the stored token still matches
const RELEASE: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
"#;

// Refresh the TTL only while the stored token still matches
const RENEW: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('pexpire', KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// [`LockStore`] backed by a single Redis node
pub struct RedisStore {
    client: redis::Client,
    acquire: Script,
    release: Script,
    renew: Script,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            acquire: Script::new(ACQUIRE),
            release: Script::new(RELEASE),
            renew: Script::new(RENEW),
        }
    }

    /// Connect to the node at `url`, e.g. `redis://127.0.0.1/`
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(backend)?;
        debug!(url, "redis lease store connected");
        Ok(Self::new(client))
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        self.client.get_connection().map_err(backend)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .finish()
    }
}

impl LockStore for RedisStore {
    fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let granted: i64 = self
            .acquire
            .key(key)
            .arg(token)
            .arg(lease.as_millis() as u64)
            .invoke(&mut conn)
            .map_err(backend)?;
        Ok(granted == 1)
    }

    fn release(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let deleted: i64 = self
            .release
            .key(key)
            .arg(token)
            .invoke(&mut conn)
            .map_err(backend)?;
        Ok(deleted == 1)
    }

    fn renew(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let refreshed: i64 = self
            .renew
            .key(key)
            .arg(token)
            .arg(lease.as_millis() as u64)
            .invoke(&mut conn)
            .map_err(backend)?;
        Ok(refreshed == 1)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("DEL")
            .arg(key)
            .exec(&mut conn)
            .map_err(backend)?;
        Ok(())
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::backend(e.to_string())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
