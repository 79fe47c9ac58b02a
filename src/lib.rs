// Lets `#[derive(Record)]` expand to `votefeed::Record` inside this crate too.
extern crate self as votefeed;

mod app;
mod config;
mod error;
pub mod gateway;
pub mod lock;
mod model;
pub mod projection;
mod reconcile;
mod store;
pub mod vote;

pub use app::AppState;
pub use config::{ConfigError, FeedConfig};
pub use error::{ErrorBody, FeedError, StateError};
pub use gateway::{FeedGateway, ListGateway, QuestionFilter, VoteGateway, VoteOutcome};
pub use model::{
    view_of, Answer, Direction, Id, Question, ViewerId, VoteRecord, VoteState, VoteView,
};
pub use projection::{Projection, ProjectionEngine, ProjectionRule};
pub use reconcile::{CrossEntityReconciler, ScoreChange};
pub use store::{EntityStore, Record, Snapshot, VoteRecordStore};
pub use vote::VoteSyncCoordinator;

#[cfg(feature = "http")]
pub use gateway::HttpGateway;

// Derive macro for `Record`
pub use votefeed_macros::Record;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
