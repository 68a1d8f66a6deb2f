//! The lock that serializes every key store operation.
//!
//! Key store backends are not assumed to be safe under concurrent access,
//! so one reentrant lock covers all aliases and all backends sharing it.
//! Reentrancy lets a caller that already holds the lock run another
//! store operation on the same thread.

use std::sync::{Arc, OnceLock};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Reentrant lock guarding a secure key store.
///
/// Managers share `StoreLock::global()` by default; tests and embedders
/// can inject their own with `KeyStoreManager::with_lock`.
pub struct StoreLock {
    inner: ReentrantMutex<()>,
}

impl StoreLock {
    pub fn new() -> Self {
        Self {
            inner: ReentrantMutex::new(()),
        }
    }

    /// The process-wide lock.
    pub fn global() -> Arc<StoreLock> {
        static GLOBAL: OnceLock<Arc<StoreLock>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(StoreLock::new())))
    }

    /// Block until the lock is held by this thread.
    pub(crate) fn acquire(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.lock()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl Default for StoreLock {
    fn default() -> Self {
        Self::new()
    }
}
