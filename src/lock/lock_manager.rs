use std::sync::Arc;

use super::{Lock, LockError, SubjectGuard};
use crate::model::Id;

/// Hands out one lock per subject id.
///
/// Repeated calls with the same id must return the same logical lock.
pub trait LockManager: Send + Sync {
    type Lock: Lock;

    fn get_lock(&self, id: Id) -> Result<Arc<Self::Lock>, LockError>;

    /// Try to mark `id` as in flight. `Ok(None)` means another mutation holds it.
    fn try_acquire(&self, id: Id) -> Result<Option<SubjectGuard<Self::Lock>>, LockError> {
        let lock = self.get_lock(id)?;
        if lock.try_lock()? {
            Ok(Some(SubjectGuard::new(id, lock)))
        } else {
            Ok(None)
        }
    }

    fn is_locked(&self, id: Id) -> Result<bool, LockError> {
        self.get_lock(id)?.is_locked()
    }

    /// Forget locks that are neither held nor handed out. Returns how many
    /// were dropped. Managers without per-id state keep the default.
    fn prune(&self) -> Result<usize, LockError> {
        Ok(0)
    }
}
