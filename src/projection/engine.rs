use std::sync::{Arc, RwLock};

#[cfg(feature = "emitter")]
use std::sync::Mutex;

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
use tracing::debug;

use super::{Projection, ProjectionRule};
use crate::error::StateError;
use crate::model::Question;
use crate::store::EntityStore;

/// Event fired after every recompute with the JSON-encoded id list.
#[cfg(feature = "emitter")]
pub const REFRESHED_EVENT: &str = "projection:refreshed";

/// Derives the displayed question list under one active rule.
///
/// Clone-friendly; clones share the active projection.
#[derive(Clone)]
pub struct ProjectionEngine {
    store: EntityStore<Question>,
    current: Arc<RwLock<Projection>>,
    #[cfg(feature = "emitter")]
    emitter: Arc<Mutex<EventEmitter>>,
}

impl ProjectionEngine {
    pub fn new(store: EntityStore<Question>) -> Self {
        Self::with_rule(store, ProjectionRule::default())
    }

    pub fn with_rule(store: EntityStore<Question>, rule: ProjectionRule) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(Projection::empty(rule))),
            #[cfg(feature = "emitter")]
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    pub fn rule(&self) -> Result<ProjectionRule, StateError> {
        Ok(self
            .current
            .read()
            .map_err(|_| StateError::Poisoned("projection read"))?
            .rule)
    }

    /// Switch the active rule, recomputing when it changes.
    pub fn set_rule(&self, rule: ProjectionRule) -> Result<Projection, StateError> {
        let changed = {
            let mut current = self
                .current
                .write()
                .map_err(|_| StateError::Poisoned("projection write"))?;
            let changed = current.rule != rule;
            current.rule = rule;
            changed
        };
        if changed {
            self.recompute()
        } else {
            self.displayed()
        }
    }

    /// Rebuild the projection from the store's current snapshot.
    pub fn recompute(&self) -> Result<Projection, StateError> {
        let snapshot = self.store.snapshot()?;
        let projection = {
            let mut current = self
                .current
                .write()
                .map_err(|_| StateError::Poisoned("projection write"))?;
            current.items = current.rule.apply(&snapshot.records);
            current.source_version = Some(snapshot.version);
            current.clone()
        };

        debug!(
            rule = %projection.rule,
            items = projection.items.len(),
            version = snapshot.version,
            "projection recomputed"
        );

        #[cfg(feature = "emitter")]
        self.notify(&projection);

        Ok(projection)
    }

    pub fn is_stale(&self) -> Result<bool, StateError> {
        let version = self.store.version()?;
        let current = self
            .current
            .read()
            .map_err(|_| StateError::Poisoned("projection read"))?;
        Ok(current.is_stale(version))
    }

    /// The active projection, recomputed first if the store has changed since.
    pub fn displayed(&self) -> Result<Projection, StateError> {
        if self.is_stale()? {
            return self.recompute();
        }
        Ok(self
            .current
            .read()
            .map_err(|_| StateError::Poisoned("projection read"))?
            .clone())
    }

    /// Drop the computed items, keeping the rule.
    pub fn reset(&self) -> Result<(), StateError> {
        let mut current = self
            .current
            .write()
            .map_err(|_| StateError::Poisoned("projection write"))?;
        *current = Projection::empty(current.rule);
        Ok(())
    }

    /// Register a listener called with the JSON-encoded ids after each recompute.
    ///
    /// Listeners run on the emitter's own threads.
    #[cfg(feature = "emitter")]
    pub fn on_refresh<F>(&self, listener: F) -> Result<(), StateError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter
            .lock()
            .map_err(|_| StateError::Poisoned("emitter"))?
            .on(REFRESHED_EVENT, listener);
        Ok(())
    }

    #[cfg(feature = "emitter")]
    fn notify(&self, projection: &Projection) {
        let payload = match serde_json::to_string(&projection.items) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode projection refresh");
                return;
            }
        };
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.emit(REFRESHED_EVENT, payload);
            }
            Err(_) => tracing::warn!("projection emitter poisoned, refresh not announced"),
        }
    }
}
