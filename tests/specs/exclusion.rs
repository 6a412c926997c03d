//! Mutual-exclusion specs
//!
//! Only one thread in the critical section at a time, and no thread
//! may stack a second acquisition on its own.

use crate::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn guarded_sections_never_overlap() {
    let deployment = Deployment::new();
    let manager = Arc::new(deployment.manager());

    let inside = Arc::new(AtomicBool::new(false));
    let mut total = 0u32;
    let counter = Arc::new(std::sync::Mutex::new(0u32));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let inside = Arc::clone(&inside);
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                let lock = manager.acquire("counter").unwrap();
                for _ in 0..25 {
                    let guard = lock.lock().unwrap();
                    assert!(!inside.swap(true, Ordering::SeqCst), "overlapping critical sections");
                    *counter.lock().unwrap() += 1;
                    inside.store(false, Ordering::SeqCst);
                    guard.unlock().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
        total += 25;
    }

    assert_eq!(*counter.lock().unwrap(), total);
    assert!(deployment.store.is_empty());
}

#[test]
fn holder_cannot_acquire_again() {
    let deployment = Deployment::new();
    let manager = deployment.manager();
    let lock = manager.acquire("jobs").unwrap();

    assert!(lock.try_lock().unwrap());
    assert!(matches!(lock.try_lock(), Err(LockError::Reentrant { .. })));
    assert!(matches!(
        lock.try_lock_for(Duration::from_millis(100)),
        Err(LockError::Reentrant { .. })
    ));
    assert!(matches!(lock.lock_for(Duration::from_millis(100)), Err(LockError::Reentrant { .. })));

    // The failed attempts did not disturb the holder
    assert!(lock.is_held_by_current_thread());
    lock.unlock().unwrap();
}

#[test]
fn foreign_lease_blocks_local_acquisition() {
    let deployment = Deployment::new();
    let manager = deployment.manager();
    let lock = manager.acquire("jobs").unwrap();

    // Another process already owns the key
    assert!(deployment
        .store
        .acquire("jobs.lock", "foreign", Duration::from_secs(30))
        .unwrap());

    assert!(!lock.try_lock().unwrap());
    assert!(!lock.try_lock_for(Duration::from_millis(300)).unwrap());
    assert!(!lock.is_held_by_current_thread());
}
