// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Redis-backed lease store for keylease
//!
//! Single-node backend: every lease is one Redis string key holding the
//! ownership token, with a millisecond TTL. Token-guarded release and
//! renewal run as Lua scripts so the compare and the write are atomic
//! on the server.

mod store;

pub use store::RedisStore;
