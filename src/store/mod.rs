//! Canonical in-memory stores.
//!
//! `EntityStore` holds the authoritative list of questions (or answers) in
//! the order the backend delivered them. `VoteRecordStore` holds the
//! viewer's confirmed votes.
//!
//! ## Example
//!
//! ```ignore
//! use votefeed::{EntityStore, Question, Record};
//!
//! let store = EntityStore::<Question>::new();
//! store.load(questions)?;
//! store.patch(7, |q| q.votes_score += 1)?;
//! let q = store.get(7)?;
//! ```

mod entity;
mod votes;

use crate::model::Id;

/// Trait for types that can be held in an `EntityStore`.
pub trait Record: Clone + Send + Sync {
    /// Collection name used in logs and `StateError::NotFound`.
    const COLLECTION: &'static str;

    fn id(&self) -> Id;
}

pub use entity::{EntityStore, Snapshot};
pub use votes::VoteRecordStore;
