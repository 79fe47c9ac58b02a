//! Projections - ordered views derived from the canonical question store.
//!
//! A projection is always a reordering or a subset of the store's ids and is
//! tagged with the store version it was computed from. Reading through
//! `ProjectionEngine::displayed` recomputes first when the store has moved
//! on, so a superseded snapshot is never handed out.
//!
//! ## Example
//!
//! ```ignore
//! use votefeed::{EntityStore, ProjectionEngine, ProjectionRule, Question};
//!
//! let store = EntityStore::<Question>::new();
//! let engine = ProjectionEngine::new(store.clone());
//!
//! store.load(questions)?;
//! engine.set_rule(ProjectionRule::ByScore)?;
//! let view = engine.displayed()?;
//! ```

mod engine;
mod rule;

pub use engine::ProjectionEngine;
#[cfg(feature = "emitter")]
pub use engine::REFRESHED_EVENT;
pub use rule::{ParseRuleError, ProjectionRule};

use crate::model::Id;

/// An ordered view over the canonical list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub rule: ProjectionRule,
    pub items: Vec<Id>,
    /// Store version the items were computed from. `None` before the first
    /// recompute.
    pub source_version: Option<u64>,
}

impl Projection {
    pub fn empty(rule: ProjectionRule) -> Self {
        Self {
            rule,
            items: Vec::new(),
            source_version: None,
        }
    }

    pub fn is_stale(&self, store_version: u64) -> bool {
        self.source_version != Some(store_version)
    }
}
