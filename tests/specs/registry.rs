//! Registry specs
//!
//! One Locker per name, shared by every caller of the same manager;
//! different names and different prefixes never contend.

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

#[test]
fn concurrent_acquires_of_one_name_share_one_locker() {
    let deployment = Deployment::new();
    let manager = Arc::new(deployment.manager());

    let threads = 8;
    let start = Arc::new(Barrier::new(threads));
    let settled = Arc::new(Barrier::new(threads));
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let start = Arc::clone(&start);
            let settled = Arc::clone(&settled);
            let wins = Arc::clone(&wins);
            std::thread::spawn(move || {
                let lock = manager.acquire("jobs").unwrap();
                start.wait();
                let won = lock.try_lock().unwrap();
                if won {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
                settled.wait();
                if won {
                    lock.unlock().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // A per-caller Locker would have let several threads through
    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert!(deployment.store.is_empty());
}

#[test]
fn different_names_do_not_contend() {
    let deployment = Deployment::new();
    let manager = deployment.manager();

    let jobs = manager.acquire("jobs").unwrap();
    let sweep = manager.acquire("sweep").unwrap();

    assert!(jobs.try_lock().unwrap());
    assert!(sweep.try_lock().unwrap());
    assert_eq!(deployment.store.len(), 2);

    jobs.unlock().unwrap();
    sweep.unlock().unwrap();
}

#[test]
fn prefixes_partition_the_store_namespace() {
    let deployment = Deployment::new();
    let billing = deployment.manager_with(LockSettings::new().with_prefix("billing"));
    let audit = deployment.manager_with(LockSettings::new().with_prefix("audit"));

    let a = billing.acquire("jobs").unwrap();
    let b = audit.acquire("jobs").unwrap();

    assert!(a.try_lock().unwrap());
    assert!(b.try_lock().unwrap());
    assert_eq!(deployment.store.value_of("billing.jobs.lock"), Some("token-1".to_string()));
    assert!(deployment.store.value_of("audit.jobs.lock").is_some());

    a.unlock().unwrap();
    b.unlock().unwrap();
}
