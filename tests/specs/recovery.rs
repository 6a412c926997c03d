//! Operator recovery specs
//!
//! Force-unlock frees a wedged name for new acquisitions, and manager
//! shutdown cancels threads still waiting on a lock.

use crate::prelude::*;
use std::sync::Arc;

#[test]
fn force_unlock_frees_a_wedged_name() {
    let deployment = Deployment::new();
    let manager = deployment.manager();

    let stuck = manager.acquire("jobs").unwrap();
    assert!(stuck.try_lock().unwrap());

    manager.force_unlock(&stuck).unwrap();
    assert!(deployment.store.is_empty());

    // A fresh Locker takes the name over immediately
    let fresh = manager.acquire("jobs").unwrap();
    assert!(fresh.try_lock().unwrap());

    // The displaced holder is told its lease is gone
    assert!(matches!(stuck.unlock(), Err(UnlockError::LeaseLost { .. })));
    fresh.unlock().unwrap();
}

#[test]
fn force_unlock_works_across_managers() {
    let deployment = Deployment::new();
    let holder_side = deployment.manager();
    let operator_side = deployment.manager();

    let held = holder_side.acquire("jobs").unwrap();
    assert!(held.try_lock().unwrap());

    let handle = operator_side.acquire("jobs").unwrap();
    operator_side.force_unlock(&handle).unwrap();

    assert!(deployment.store.is_empty());
    assert!(matches!(held.unlock(), Err(UnlockError::LeaseLost { .. })));
}

#[test]
fn manager_shutdown_cancels_waiting_threads() {
    let deployment = Deployment::new();
    let manager = deployment.manager();
    let lock = manager.acquire("jobs").unwrap();

    // Held by another process for the whole test
    assert!(deployment
        .store
        .acquire("jobs.lock", "foreign", Duration::from_secs(300))
        .unwrap());

    let waiter = {
        let lock = lock.clone();
        std::thread::spawn(move || lock.try_lock_for(Duration::from_secs(60)))
    };
    std::thread::sleep(Duration::from_millis(200));

    drop(manager);

    let outcome = waiter.join().unwrap();
    assert!(matches!(outcome, Err(LockError::Cancelled { .. })));
    assert!(!lock.is_held_by_current_thread());
}

#[test]
fn store_faults_surface_and_leave_the_locker_reusable() {
    let deployment = Deployment::new();
    let manager = Arc::new(deployment.manager());
    let lock = manager.acquire("jobs").unwrap();

    deployment.store.fail_acquires(true);
    assert!(matches!(lock.try_lock(), Err(LockError::Store(_))));

    deployment.store.fail_acquires(false);
    assert!(lock.try_lock().unwrap());
    lock.unlock().unwrap();
}
