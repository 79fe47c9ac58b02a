use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Record;
use crate::error::StateError;
use crate::model::Id;

struct Inner<R> {
    records: Vec<R>,
    version: u64,
    // Store version at which each record was last written wholesale.
    revisions: HashMap<Id, u64>,
}

impl<R> Inner<R> {
    fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

/// Records plus the store version they were read at.
#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    pub records: Vec<R>,
    pub version: u64,
}

/// Ordered canonical store keyed by record id.
///
/// Iteration order is the order records were loaded or first inserted.
/// Every mutation bumps `version`, which is how projections detect that
/// they are stale. Each record also carries a revision that moves only when
/// the record is written wholesale (`load`, `replace`, `merge`), so a patch
/// can be made conditional on nobody having swapped the record in between.
/// Clone-friendly via Arc.
pub struct EntityStore<R> {
    inner: Arc<RwLock<Inner<R>>>,
}

impl<R> Clone for EntityStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> Default for EntityStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> EntityStore<R> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                records: Vec::new(),
                version: 0,
                revisions: HashMap::new(),
            })),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner<R>>, StateError> {
        self.inner.read().map_err(|_| StateError::Poisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner<R>>, StateError> {
        self.inner.write().map_err(|_| StateError::Poisoned("write"))
    }

    fn not_found(id: Id) -> StateError {
        StateError::NotFound {
            collection: R::COLLECTION,
            id,
        }
    }

    /// Replace the canonical set wholesale.
    ///
    /// Later duplicates of an id overwrite earlier ones in place.
    pub fn load(&self, records: Vec<R>) -> Result<(), StateError> {
        let mut inner = self.write()?;
        let mut deduped: Vec<R> = Vec::with_capacity(records.len());
        for record in records {
            match deduped.iter_mut().find(|r| r.id() == record.id()) {
                Some(slot) => *slot = record,
                None => deduped.push(record),
            }
        }
        let version = inner.bump();
        inner.revisions = deduped.iter().map(|r| (r.id(), version)).collect();
        inner.records = deduped;
        Ok(())
    }

    /// Apply `f` to the record with `id`. Fails with `NotFound` if absent.
    ///
    /// `f` must not change the record's id.
    pub fn patch<F>(&self, id: Id, f: F) -> Result<R, StateError>
    where
        F: FnOnce(&mut R),
    {
        self.patch_tracked(id, f).map(|(patched, _)| patched)
    }

    /// `patch`, also returning the record's revision read under the same lock.
    pub fn patch_tracked<F>(&self, id: Id, f: F) -> Result<(R, u64), StateError>
    where
        F: FnOnce(&mut R),
    {
        let mut inner = self.write()?;
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        f(record);
        debug_assert_eq!(record.id(), id, "patch must not change the record id");
        let patched = record.clone();
        inner.bump();
        let revision = inner.revisions.get(&id).copied().unwrap_or_default();
        Ok((patched, revision))
    }

    /// Like `patch`, but only while the record is still at `revision`.
    ///
    /// Returns `Ok(None)` without touching anything when the record has been
    /// written wholesale (or removed) since `revision` was read.
    pub fn patch_at<F>(&self, id: Id, revision: u64, f: F) -> Result<Option<R>, StateError>
    where
        F: FnOnce(&mut R),
    {
        let mut inner = self.write()?;
        if inner.revisions.get(&id) != Some(&revision) {
            return Ok(None);
        }
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        f(record);
        let patched = record.clone();
        inner.bump();
        Ok(Some(patched))
    }

    /// Revision of the record with `id`, if present.
    pub fn revision(&self, id: Id) -> Result<Option<u64>, StateError> {
        Ok(self.read()?.revisions.get(&id).copied())
    }

    /// Replace an existing record wholesale, keeping its position.
    pub fn replace(&self, record: R) -> Result<(), StateError> {
        let mut inner = self.write()?;
        let id = record.id();
        let slot = inner
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        *slot = record;
        let version = inner.bump();
        inner.revisions.insert(id, version);
        Ok(())
    }

    /// Insert or replace each record; new ids are appended in order.
    pub fn merge(&self, records: Vec<R>) -> Result<(), StateError> {
        let mut inner = self.write()?;
        let version = inner.bump();
        for record in records {
            let id = record.id();
            match inner.records.iter_mut().find(|r| r.id() == id) {
                Some(slot) => *slot = record,
                None => inner.records.push(record),
            }
            inner.revisions.insert(id, version);
        }
        Ok(())
    }

    /// Remove the record with `id`. Removing an absent id is a no-op.
    ///
    /// Returns whether a record was removed.
    pub fn remove(&self, id: Id) -> Result<bool, StateError> {
        let mut inner = self.write()?;
        let before = inner.records.len();
        inner.records.retain(|r| r.id() != id);
        let removed = inner.records.len() != before;
        if removed {
            inner.revisions.remove(&id);
            inner.bump();
        }
        Ok(removed)
    }

    /// Keep only the records matching `predicate`. Returns how many were dropped.
    pub fn retain<F>(&self, predicate: F) -> Result<usize, StateError>
    where
        F: Fn(&R) -> bool,
    {
        let mut inner = self.write()?;
        let before = inner.records.len();
        inner.records.retain(|r| predicate(r));
        let dropped = before - inner.records.len();
        if dropped > 0 {
            let Inner {
                records, revisions, ..
            } = &mut *inner;
            revisions.retain(|id, _| records.iter().any(|r| r.id() == *id));
            inner.bump();
        }
        Ok(dropped)
    }

    pub fn clear(&self) -> Result<(), StateError> {
        let mut inner = self.write()?;
        inner.records.clear();
        inner.revisions.clear();
        inner.bump();
        Ok(())
    }

    pub fn get(&self, id: Id) -> Result<Option<R>, StateError> {
        Ok(self.read()?.records.iter().find(|r| r.id() == id).cloned())
    }

    pub fn contains(&self, id: Id) -> Result<bool, StateError> {
        Ok(self.read()?.records.iter().any(|r| r.id() == id))
    }

    pub fn all(&self) -> Result<Vec<R>, StateError> {
        Ok(self.read()?.records.clone())
    }

    pub fn ids(&self) -> Result<Vec<Id>, StateError> {
        Ok(self.read()?.records.iter().map(Record::id).collect())
    }

    pub fn find<F>(&self, predicate: F) -> Result<Vec<R>, StateError>
    where
        F: Fn(&R) -> bool,
    {
        Ok(self
            .read()?
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    pub fn len(&self) -> Result<usize, StateError> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StateError> {
        Ok(self.read()?.records.is_empty())
    }

    pub fn version(&self) -> Result<u64, StateError> {
        Ok(self.read()?.version)
    }

    /// Records and version read under one lock.
    pub fn snapshot(&self) -> Result<Snapshot<R>, StateError> {
        let inner = self.read()?;
        Ok(Snapshot {
            records: inner.records.clone(),
            version: inner.version,
        })
    }
}
