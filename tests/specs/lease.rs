//! Lease lifecycle specs
//!
//! Leases expire without renewal, expired names can be taken over by
//! another manager, and the late holder learns of the loss on unlock.

use crate::prelude::*;

#[test]
fn lease_floor_applies_end_to_end() {
    let deployment = Deployment::new();
    let manager = deployment.manager_with(LockSettings::new().with_lease(Duration::from_secs(5)));
    assert_eq!(manager.lease(), Duration::from_secs(30));

    let lock = manager.acquire("jobs").unwrap();
    assert!(lock.try_lock().unwrap());
    assert_eq!(deployment.store.ttl_of("jobs.lock"), Some(Duration::from_secs(30)));
    lock.unlock().unwrap();
}

#[test]
fn expired_lease_can_be_taken_over() {
    let deployment = Deployment::new();
    let first = deployment.manager();
    let second = deployment.manager();

    let held = first.acquire("jobs").unwrap();
    assert!(held.try_lock().unwrap());

    // Past the lease with no renewal cycle in between
    deployment.clock.advance(Duration::from_secs(31));

    let taker = second.acquire("jobs").unwrap();
    assert!(taker.try_lock().unwrap());

    // The late holder finds out when it releases
    assert!(matches!(held.unlock(), Err(UnlockError::LeaseLost { .. })));
    assert!(!held.is_held_by_current_thread());

    // The takeover is unaffected by the stale release
    taker.unlock().unwrap();
    assert!(deployment.store.is_empty());
}

#[test]
fn live_lease_survives_the_clock_short_of_expiry() {
    let deployment = Deployment::new();
    let first = deployment.manager();
    let second = deployment.manager();

    let held = first.acquire("jobs").unwrap();
    assert!(held.try_lock().unwrap());

    deployment.clock.advance(Duration::from_secs(29));

    let contender = second.acquire("jobs").unwrap();
    assert!(!contender.try_lock().unwrap());
    held.unlock().unwrap();
}

#[test]
fn repeated_round_trips_leave_no_residue() {
    let deployment = Deployment::new();
    let manager = deployment.manager();
    let lock = manager.acquire("jobs").unwrap();

    for _ in 0..5 {
        let guard = lock.lock().unwrap();
        guard.unlock().unwrap();
    }

    assert!(deployment.store.is_empty());
    assert!(!lock.is_held_by_current_thread());
    assert_eq!(manager.stats().held, 0);
}
