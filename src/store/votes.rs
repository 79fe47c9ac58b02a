use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StateError;
use crate::model::{Id, ViewerId, VoteRecord, VoteState};

/// Confirmed vote records, at most one per (subject, owner).
///
/// Only the vote coordinator writes here, and only after the backend has
/// confirmed a mutation. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct VoteRecordStore {
    records: Arc<RwLock<HashMap<(Id, ViewerId), VoteRecord>>>,
}

impl VoteRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<(Id, ViewerId), VoteRecord>>, StateError> {
        self.records
            .read()
            .map_err(|_| StateError::Poisoned("vote read"))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<(Id, ViewerId), VoteRecord>>, StateError> {
        self.records
            .write()
            .map_err(|_| StateError::Poisoned("vote write"))
    }

    /// Replace all records. Two records for the same (subject, owner) are rejected
    /// and leave the store untouched.
    pub fn load(&self, records: Vec<VoteRecord>) -> Result<(), StateError> {
        let mut fresh = HashMap::with_capacity(records.len());
        for record in records {
            let key = (record.subject_id, record.owner_id);
            if fresh.contains_key(&key) {
                return Err(StateError::DuplicateVote {
                    subject_id: record.subject_id,
                    owner_id: record.owner_id,
                });
            }
            fresh.insert(key, record);
        }
        *self.write()? = fresh;
        Ok(())
    }

    pub fn get(&self, subject_id: Id, owner_id: ViewerId) -> Result<Option<VoteRecord>, StateError> {
        Ok(self.read()?.get(&(subject_id, owner_id)).cloned())
    }

    pub fn state_of(&self, subject_id: Id, owner_id: ViewerId) -> Result<VoteState, StateError> {
        Ok(VoteState::from_record(
            self.read()?.get(&(subject_id, owner_id)),
        ))
    }

    /// Insert a new record. A second record for the same (subject, owner) is a
    /// logic error; callers must route to `replace` or `remove` instead.
    pub fn insert(&self, record: VoteRecord) -> Result<(), StateError> {
        let mut records = self.write()?;
        let key = (record.subject_id, record.owner_id);
        if records.contains_key(&key) {
            return Err(StateError::DuplicateVote {
                subject_id: record.subject_id,
                owner_id: record.owner_id,
            });
        }
        records.insert(key, record);
        Ok(())
    }

    /// Replace the existing record for the same (subject, owner).
    pub fn replace(&self, record: VoteRecord) -> Result<(), StateError> {
        let mut records = self.write()?;
        let slot = records
            .get_mut(&(record.subject_id, record.owner_id))
            .ok_or(StateError::MissingVote {
                subject_id: record.subject_id,
            })?;
        *slot = record;
        Ok(())
    }

    pub fn remove(&self, subject_id: Id, owner_id: ViewerId) -> Result<Option<VoteRecord>, StateError> {
        Ok(self.write()?.remove(&(subject_id, owner_id)))
    }

    pub fn records_for(&self, owner_id: ViewerId) -> Result<Vec<VoteRecord>, StateError> {
        let mut records: Vec<VoteRecord> = self
            .read()?
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.subject_id);
        Ok(records)
    }

    pub fn len(&self) -> Result<usize, StateError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StateError> {
        Ok(self.read()?.is_empty())
    }

    pub fn clear(&self) -> Result<(), StateError> {
        self.write()?.clear();
        Ok(())
    }
}
