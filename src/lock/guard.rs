use std::sync::Arc;

use tracing::warn;

use super::Lock;
use crate::model::Id;

/// Releases the subject lock when dropped, including when the owning
/// future is dropped before it resolves.
pub struct SubjectGuard<L: Lock> {
    id: Id,
    lock: Arc<L>,
}

impl<L: Lock> SubjectGuard<L> {
    pub(crate) fn new(id: Id, lock: Arc<L>) -> Self {
        Self { id, lock }
    }

    pub fn id(&self) -> Id {
        self.id
    }
}

impl<L: Lock> Drop for SubjectGuard<L> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.unlock() {
            warn!(subject_id = self.id, error = %err, "failed to release subject lock");
        }
    }
}
