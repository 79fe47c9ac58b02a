use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{Lock, LockError, LockManager};
use crate::model::Id;

/// In-memory lock backed by `Mutex<bool>`.
pub struct InMemoryLock {
    state: Mutex<bool>,
}

impl InMemoryLock {
    pub fn new() -> Self {
        InMemoryLock {
            state: Mutex::new(false),
        }
    }
}

impl Default for InMemoryLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for InMemoryLock {
    fn try_lock(&self) -> Result<bool, LockError> {
        let mut locked = self
            .state
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        if *locked {
            Ok(false)
        } else {
            *locked = true;
            Ok(true)
        }
    }

    fn unlock(&self) -> Result<(), LockError> {
        let mut locked = self
            .state
            .lock()
            .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        *locked = false;
        Ok(())
    }

    fn is_locked(&self) -> Result<bool, LockError> {
        self.state
            .lock()
            .map(|locked| *locked)
            .map_err(|e| LockError::Poisoned(e.to_string()))
    }
}

/// Lazily creates one `InMemoryLock` per subject id.
pub struct InMemoryLockManager {
    locks: Mutex<HashMap<Id, Arc<InMemoryLock>>>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        InMemoryLockManager {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for InMemoryLockManager {
    type Lock = InMemoryLock;

    fn get_lock(&self, id: Id) -> Result<Arc<InMemoryLock>, LockError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock manager map poisoned".into()))?;
        Ok(locks
            .entry(id)
            .or_insert_with(|| Arc::new(InMemoryLock::new()))
            .clone())
    }

    fn prune(&self) -> Result<usize, LockError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock manager map poisoned".into()))?;
        let before = locks.len();
        // A lock still referenced elsewhere may be about to be taken.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1 || lock.is_locked().unwrap_or(true));
        Ok(before - locks.len())
    }
}
