//! Single-writer / multi-reader access to a store across threads.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, TreeError};
use crate::store::TreeStore;

/// A [`TreeStore`] behind a read-write lock.
///
/// Readers (lookups, path resolution, serialization) may hold the lock
/// together; a mutation takes it exclusively, so no reader ever observes a
/// half-applied change. Clones share the same store.
#[derive(Clone, Debug)]
pub struct SharedStore {
    inner: Arc<RwLock<TreeStore>>,
}

impl SharedStore {
    pub fn new(store: TreeStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Acquire shared read access.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, TreeStore>> {
        self.inner.read().map_err(|_| TreeError::LockPoisoned)
    }

    /// Acquire exclusive write access.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, TreeStore>> {
        self.inner.write().map_err(|_| TreeError::LockPoisoned)
    }

    /// Run `f` with read access.
    pub fn with_read<R>(&self, f: impl FnOnce(&TreeStore) -> R) -> Result<R> {
        Ok(f(&*self.read()?))
    }

    /// Run `f` with write access.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut TreeStore) -> R) -> Result<R> {
        Ok(f(&mut *self.write()?))
    }
}

impl From<TreeStore> for SharedStore {
    fn from(store: TreeStore) -> Self {
        Self::new(store)
    }
}
