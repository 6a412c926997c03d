//! Shared helpers for keylease specs

pub use keylease_core::{
    CountingMinter, FakeClock, LockError, LockManager, LockSettings, LockStore, MemoryStore,
    UnlockError,
};
pub use std::time::Duration;

pub type SpecStore = MemoryStore<FakeClock>;
pub type SpecManager = LockManager<SpecStore, CountingMinter>;

/// A simulated deployment: one shared store plus its test clock
pub struct Deployment {
    pub clock: FakeClock,
    pub store: SpecStore,
    minter: CountingMinter,
}

impl Deployment {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        let store = MemoryStore::with_clock(clock.clone());
        Self {
            clock,
            store,
            minter: CountingMinter::new("token"),
        }
    }

    /// A manager sharing this deployment's store, as another process would
    pub fn manager(&self) -> SpecManager {
        self.manager_with(LockSettings::default())
    }

    pub fn manager_with(&self, settings: LockSettings) -> SpecManager {
        // Clones share the counter, keeping tokens unique across managers
        LockManager::with_minter(settings, self.store.clone(), self.minter.clone()).unwrap()
    }
}
