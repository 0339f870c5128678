use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StateStoreError;
use crate::store::StateStore;

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    bytes: Mutex<Option<Vec<u8>>>,
    save_count: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose first `load` returns `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
            ..Self::default()
        }
    }

    /// Makes every following `save` fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        lock_unpoisoned(&self.bytes).clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StateStoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StateStoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StateStoreError::unavailable("saves are disabled"));
        }

        *lock_unpoisoned(&self.bytes) = Some(bytes.to_vec());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
